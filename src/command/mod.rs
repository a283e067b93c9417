//! External command execution for compile providers
//!
//! Compile providers shell out to asset compilers (`sass`, `lessc`, or any
//! configured command). This module runs such a command to completion, captures
//! its output, and converts every failure mode into a typed [`PagewrightError`]:
//!
//! - the program cannot be spawned: [`PagewrightError::CommandNotFound`]
//! - the program exits non-zero: [`PagewrightError::CommandFailed`] carrying stderr
//! - the optional timeout elapses: the child is killed and
//!   [`PagewrightError::CommandTimedOut`] is returned
//!
//! Rendering is synchronous, so commands are run with [`std::process`] and
//! [`wait_timeout`] rather than on the async runtime.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagewright::command::{CompilerCommand, run_command};
//! use std::time::Duration;
//!
//! # fn example() -> anyhow::Result<()> {
//! let stdout = run_command(&["sass".into(), "--version".into()], None)?;
//! println!("{stdout}");
//!
//! let output = CompilerCommand::new()
//!     .args(["lessc", "--source-map", "index.less", "index.css"])
//!     .with_timeout(Some(Duration::from_secs(30)))
//!     .with_context("homepage/index.html")
//!     .execute()?;
//! assert!(output.stderr.is_empty());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

use crate::core::PagewrightError;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

/// Builder for an external compiler invocation.
///
/// The first argument is the program, the rest are passed through unchanged.
/// No shell is involved, so arguments never need quoting.
#[derive(Debug, Clone, Default)]
pub struct CompilerCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout_duration: Option<Duration>,
    context: Option<String>,
}

impl CompilerCommand {
    /// Creates an empty command with no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command in `dir` instead of the process working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set a timeout for the command (None waits indefinitely)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context for logging (typically the template being rendered)
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The full command line, space-joined, as used in logs and errors.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }

    /// Execute the command and return its captured output
    ///
    /// # Errors
    ///
    /// - [`PagewrightError::Config`] if no program was given
    /// - [`PagewrightError::CommandNotFound`] if the program cannot be found
    /// - [`PagewrightError::CommandFailed`] on a non-zero exit
    /// - [`PagewrightError::CommandTimedOut`] if the timeout elapsed
    pub fn execute(self) -> Result<CommandOutput> {
        let Some((program, args)) = self.args.split_first() else {
            return Err(PagewrightError::Config {
                message: "cannot run an empty command".to_string(),
            }
            .into());
        };

        let command_line = self.command_line();
        let prefix = self.context.as_deref().map(|ctx| format!("({ctx}) ")).unwrap_or_default();
        tracing::debug!(target: "command", "{}Executing command: {}", prefix, command_line);

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PagewrightError::CommandNotFound {
                    program: program.clone(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to spawn command: {command_line}"));
            }
        };

        // Drain both pipes while waiting so a chatty compiler cannot block on a full buffer
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match self.timeout_duration {
            Some(duration) => {
                let waited = child
                    .wait_timeout(duration)
                    .with_context(|| format!("Failed to wait for command: {command_line}"))?;
                match waited {
                    Some(status) => status,
                    None => {
                        tracing::warn!(
                            target: "command",
                            "{}Command timed out after {} seconds: {}",
                            prefix,
                            duration.as_secs(),
                            command_line
                        );
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(PagewrightError::CommandTimedOut {
                            command: command_line,
                            seconds: duration.as_secs(),
                        }
                        .into());
                    }
                }
            }
            None => child
                .wait()
                .with_context(|| format!("Failed to wait for command: {command_line}"))?,
        };

        let stdout = collect(stdout_reader);
        let stderr = collect(stderr_reader);

        if !status.success() {
            tracing::debug!(
                target: "command",
                "{}Command failed with exit code: {:?}",
                prefix,
                status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "command", "Error: {}", stderr);
            }
            return Err(PagewrightError::CommandFailed {
                command: command_line,
                status: status.to_string(),
                stderr,
            }
            .into());
        }

        tracing::debug!(
            target: "command",
            "{}Command completed successfully in {:.2?}",
            prefix,
            start.elapsed()
        );
        if !stderr.is_empty() {
            tracing::trace!(target: "command", "{}", stderr);
        }

        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .map(|handle| handle.join().unwrap_or_default())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Runs `args` (program first) and returns its stdout.
///
/// Shorthand for [`CompilerCommand`] without a working directory or log context.
///
/// # Errors
///
/// See [`CompilerCommand::execute`].
pub fn run_command(args: &[String], timeout: Option<Duration>) -> Result<String> {
    let output = CompilerCommand::new().args(args.iter().cloned()).with_timeout(timeout).execute()?;
    Ok(output.stdout)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_run_command_captures_stdout() {
        let stdout = run_command(&strings(&["echo", "compiled"]), None).unwrap();
        assert_eq!(stdout.trim(), "compiled");
    }

    #[test]
    fn test_run_command_nonzero_exit_carries_stderr() {
        let err = run_command(&strings(&["sh", "-c", "echo 'bad selector' >&2; exit 3"]), None)
            .unwrap_err();

        match err.downcast_ref::<PagewrightError>() {
            Some(PagewrightError::CommandFailed {
                command,
                stderr,
                ..
            }) => {
                assert!(command.starts_with("sh -c"));
                assert!(stderr.contains("bad selector"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_command_missing_program() {
        let err = run_command(&strings(&["pagewright-no-such-compiler"]), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PagewrightError>(),
            Some(PagewrightError::CommandNotFound { program }) if program == "pagewright-no-such-compiler"
        ));
    }

    #[test]
    fn test_run_command_timeout_kills_child() {
        let start = Instant::now();
        let err = run_command(&strings(&["sleep", "5"]), Some(Duration::from_millis(200)))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PagewrightError>(),
            Some(PagewrightError::CommandTimedOut { .. })
        ));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_empty_command_is_config_error() {
        let err = run_command(&[], None).unwrap_err();
        assert!(matches!(err.downcast_ref::<PagewrightError>(), Some(PagewrightError::Config { .. })));
    }

    #[test]
    fn test_current_dir() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "here").unwrap();

        let output =
            CompilerCommand::new().args(["cat", "marker.txt"]).current_dir(temp.path()).execute().unwrap();
        assert_eq!(output.stdout, "here");
    }
}
