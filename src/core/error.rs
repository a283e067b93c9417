//! Error handling for pagewright
//!
//! This module provides the error type shared by every layer of the crate and the
//! user-friendly reporting used by the command-line interface. The error system
//! follows two rules:
//! 1. **Strongly-typed errors** so callers (and tests) can match on the failure
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Configuration**: [`PagewrightError::Config`], [`PagewrightError::UnknownProviderKind`],
//!   [`PagewrightError::MissingOption`], [`PagewrightError::InvalidBaseDir`], ...
//!   These surface at startup or on first use and are always fatal.
//! - **Compilation**: [`PagewrightError::CommandNotFound`], [`PagewrightError::CommandFailed`],
//!   [`PagewrightError::CommandTimedOut`]. Fatal to the current render or command.
//! - **Dispatch**: [`PagewrightError::ViewNotFound`], [`PagewrightError::RedirectLoop`].
//! - **Templates**: [`PagewrightError::TemplateNotFound`], [`PagewrightError::TemplateCycle`],
//!   [`PagewrightError::RenderFailed`].
//!
//! Redirects are not errors: views return them as values (see
//! [`crate::router::DispatchResult`]) and the controller turns them into responses.
//! Missing companion files (a template without a stylesheet) are not errors either;
//! the provider for that file is simply disabled.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagewright::core::{PagewrightError, user_friendly_error};
//!
//! let error = PagewrightError::UnknownProviderKind {
//!     kind: "compile_stylus".to_string(),
//!     group: "template".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for pagewright operations
///
/// Each variant carries enough context (paths, command lines, captured output)
/// to diagnose the failure without re-running with extra logging.
///
/// # Pattern Matching on Errors
///
/// ```rust,no_run
/// use pagewright::core::PagewrightError;
///
/// fn report(error: &PagewrightError) {
///     match error {
///         PagewrightError::CommandFailed { command, stderr, .. } => {
///             eprintln!("{command} failed:\n{stderr}");
///         }
///         PagewrightError::ViewNotFound { path, .. } => {
///             eprintln!("no view for {path}");
///         }
///         other => eprintln!("{other}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum PagewrightError {
    /// Generic configuration problem in the settings file or in code-registered options
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// A provider group lists a kind that no registered constructor answers to
    ///
    /// Raised while building factories, before any template is rendered.
    #[error("Unknown provider kind '{kind}' in provider group '{group}'")]
    UnknownProviderKind {
        /// The kind name found in the settings
        kind: String,
        /// The provider group the kind was listed under
        group: String,
    },

    /// A provider needs an option that is neither configured nor derivable
    ///
    /// For compile providers this happens when `sourcepath`, `targetpath` or
    /// `command` is unset and the provider kind has no default for it, or when
    /// the template lives outside every registered app so no default path can
    /// be derived.
    #[error("{provider} must set `{option}` in its options")]
    MissingOption {
        /// The provider kind
        provider: String,
        /// The missing option name
        option: String,
    },

    /// The settings file does not define `base_dir`
    #[error("Settings are missing the base_dir value")]
    MissingBaseDir,

    /// `base_dir` is set but does not point to a directory
    #[error("Settings value base_dir is not a valid directory: {path}")]
    InvalidBaseDir {
        /// The configured path
        path: String,
    },

    /// Two `[[apps]]` entries share a name
    #[error("App '{name}' is registered more than once")]
    DuplicateApp {
        /// The repeated app name
        name: String,
    },

    /// An app name was requested that is not registered in the settings
    #[error("App '{name}' is not registered")]
    UnknownApp {
        /// The requested app name
        name: String,
    },

    /// A template could not be located in any registered app
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        /// Canonical template name (`app/path`)
        name: String,
    },

    /// Template inheritance loops back onto itself
    #[error("Template inheritance cycle detected: {chain}")]
    TemplateCycle {
        /// The chain of template names, leaf first, ending with the repeated one
        chain: String,
    },

    /// The template engine rejected or failed to render a template
    #[error("Failed to render template '{name}'")]
    RenderFailed {
        /// Canonical template name
        name: String,
        /// Message from the template engine, including its causes
        reason: String,
    },

    /// An external command's executable could not be found or spawned
    #[error("Command not found: {program}")]
    CommandNotFound {
        /// The executable that was requested
        program: String,
    },

    /// An external command exited with a non-zero status
    #[error("Command failed with {status}: {command}")]
    CommandFailed {
        /// The full command line
        command: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// An external command ran longer than the configured timeout and was killed
    #[error("Command timed out after {seconds}s: {command}")]
    CommandTimedOut {
        /// The full command line
        command: String,
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// No view target could be resolved for a request path
    #[error("No view found for '{path}'")]
    ViewNotFound {
        /// The raw request path
        path: String,
        /// Why resolution failed
        reason: String,
    },

    /// Internal redirects chained past the configured limit
    #[error("Too many internal redirects (limit {limit}): {chain}")]
    RedirectLoop {
        /// The configured maximum
        limit: usize,
        /// The targets visited, in order
        chain: String,
    },

    /// The bundle command would overwrite an existing entry file
    #[error("Refusing to destroy existing file: {path} (use --overwrite option or remove the file)")]
    EntryFileExists {
        /// Path of the existing file
        path: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Settings file parse error
    #[error("Settings parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Anything else
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for PagewrightError {
    fn clone(&self) -> Self {
        match self {
            Self::Config {
                message,
            } => Self::Config {
                message: message.clone(),
            },
            Self::UnknownProviderKind {
                kind,
                group,
            } => Self::UnknownProviderKind {
                kind: kind.clone(),
                group: group.clone(),
            },
            Self::MissingOption {
                provider,
                option,
            } => Self::MissingOption {
                provider: provider.clone(),
                option: option.clone(),
            },
            Self::MissingBaseDir => Self::MissingBaseDir,
            Self::InvalidBaseDir {
                path,
            } => Self::InvalidBaseDir {
                path: path.clone(),
            },
            Self::DuplicateApp {
                name,
            } => Self::DuplicateApp {
                name: name.clone(),
            },
            Self::UnknownApp {
                name,
            } => Self::UnknownApp {
                name: name.clone(),
            },
            Self::TemplateNotFound {
                name,
            } => Self::TemplateNotFound {
                name: name.clone(),
            },
            Self::TemplateCycle {
                chain,
            } => Self::TemplateCycle {
                chain: chain.clone(),
            },
            Self::RenderFailed {
                name,
                reason,
            } => Self::RenderFailed {
                name: name.clone(),
                reason: reason.clone(),
            },
            Self::CommandNotFound {
                program,
            } => Self::CommandNotFound {
                program: program.clone(),
            },
            Self::CommandFailed {
                command,
                status,
                stderr,
            } => Self::CommandFailed {
                command: command.clone(),
                status: status.clone(),
                stderr: stderr.clone(),
            },
            Self::CommandTimedOut {
                command,
                seconds,
            } => Self::CommandTimedOut {
                command: command.clone(),
                seconds: *seconds,
            },
            Self::ViewNotFound {
                path,
                reason,
            } => Self::ViewNotFound {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::RedirectLoop {
                limit,
                chain,
            } => Self::RedirectLoop {
                limit: *limit,
                chain: chain.clone(),
            },
            Self::EntryFileExists {
                path,
            } => Self::EntryFileExists {
                path: path.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("Settings parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps a [`PagewrightError`] and adds an optional suggestion
/// for resolution and optional details. When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// ```rust,no_run
/// use pagewright::core::{PagewrightError, ErrorContext};
///
/// let context = ErrorContext::new(PagewrightError::MissingBaseDir)
///     .with_suggestion("Add base_dir = \".\" to pagewright.toml")
///     .with_details("base_dir anchors every relative asset path");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PagewrightError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: PagewrightError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`PagewrightError`] variants anywhere in the `anyhow` context chain,
/// plain [`std::io::Error`]s and settings parse errors. Everything else is reported
/// with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(pw_error) = error.downcast_ref::<PagewrightError>() {
        let mut context = create_error_context(pw_error.clone());
        if context.details.is_none() {
            let chain = cause_chain(&error);
            if !chain.is_empty() {
                context.details = Some(chain);
            }
        }
        return context;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(PagewrightError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the project and static directories")
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(PagewrightError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(PagewrightError::Config {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your pagewright.toml file")
        .with_details("Settings are read from --settings, $PAGEWRIGHT_SETTINGS or ./pagewright.toml");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain = cause_chain(&error);
    if !chain.is_empty() {
        message.push_str("\n\n");
        message.push_str(&chain);
    }

    ErrorContext::new(PagewrightError::Other {
        message,
    })
}

fn cause_chain(error: &anyhow::Error) -> String {
    let causes: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();
    if causes.is_empty() {
        return String::new();
    }

    let mut message = String::from("Caused by:");
    for (i, cause) in causes.iter().enumerate() {
        message.push_str(&format!("\n  {}: {}", i + 1, cause));
    }
    message
}

/// Map each [`PagewrightError`] variant to a context with tailored suggestions.
fn create_error_context(error: PagewrightError) -> ErrorContext {
    match &error {
        PagewrightError::UnknownProviderKind { .. } => ErrorContext::new(error)
            .with_suggestion("Use one of the built-in kinds (compile, compile_scss, compile_less, css_link, js_link) or register a custom kind before building factories")
            .with_details("Provider kinds are resolved when the provider group is first loaded"),

        PagewrightError::MissingOption { option, .. } => {
            let option = option.clone();
            ErrorContext::new(error).with_suggestion(format!(
                "Set `{option}` on the provider entry in pagewright.toml, or use a provider kind that derives it"
            ))
        }

        PagewrightError::MissingBaseDir | PagewrightError::InvalidBaseDir { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Set base_dir in pagewright.toml to the project directory (relative paths resolve from the settings file)")
                .with_details("base_dir anchors source paths in debug mode and the entry-file header")
        }

        PagewrightError::DuplicateApp { .. } => ErrorContext::new(error)
            .with_suggestion("Give each [[apps]] entry in pagewright.toml a unique name")
            .with_details("Templates are addressed as app/path, so two apps with one name would shadow each other"),

        PagewrightError::UnknownApp { .. } => ErrorContext::new(error)
            .with_suggestion("Register the app under [[apps]] in pagewright.toml or check the spelling"),

        PagewrightError::CommandNotFound { program } => {
            let program = program.clone();
            ErrorContext::new(error)
                .with_suggestion(format!("Install `{program}` and make sure it is on your PATH"))
                .with_details("Compile providers call external compilers such as sass or lessc")
        }

        PagewrightError::CommandFailed { stderr, .. } => {
            let stderr = stderr.trim().to_string();
            let context = ErrorContext::new(error)
                .with_suggestion("Fix the source file or run the command manually to see its full output");
            if stderr.is_empty() { context } else { context.with_details(stderr) }
        }

        PagewrightError::CommandTimedOut { .. } => ErrorContext::new(error)
            .with_suggestion("Raise command_timeout_secs in pagewright.toml or remove it to wait indefinitely"),

        PagewrightError::TemplateCycle { .. } => ErrorContext::new(error)
            .with_suggestion("Remove the extends tag that points back into the chain"),

        PagewrightError::RenderFailed { reason, .. } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_details(reason)
                .with_suggestion("Check template syntax and that every variable used is in the context")
        }

        PagewrightError::EntryFileExists { .. } => ErrorContext::new(error)
            .with_suggestion("Re-run with --overwrite if the file was generated, or remove it manually"),

        PagewrightError::RedirectLoop { .. } => ErrorContext::new(error)
            .with_suggestion("Check views that return internal redirects for a cycle"),

        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display() {
        let error = PagewrightError::MissingBaseDir;
        assert_eq!(error.to_string(), "Settings are missing the base_dir value");

        let error = PagewrightError::UnknownProviderKind {
            kind: "compile_stylus".to_string(),
            group: "template".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unknown provider kind 'compile_stylus' in provider group 'template'"
        );

        let error = PagewrightError::EntryFileExists {
            path: "app/scripts/__entry__.js".to_string(),
        };
        assert!(error.to_string().starts_with("Refusing to destroy existing file"));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(PagewrightError::MissingBaseDir).with_suggestion("Set base_dir");

        let display = format!("{ctx}");
        assert!(display.contains("Settings are missing the base_dir value"));
        assert!(display.contains("Suggestion: Set base_dir"));
    }

    #[test]
    fn test_user_friendly_error_finds_typed_error_through_context() {
        let error = anyhow::Error::from(PagewrightError::CommandNotFound {
            program: "sass".to_string(),
        })
        .context("Compiling homepage/styles/index.scss");

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, PagewrightError::CommandNotFound { .. }));
        assert!(ctx.suggestion.unwrap().contains("sass"));
    }

    #[test]
    fn test_user_friendly_error_command_failed_shows_stderr() {
        let error = PagewrightError::CommandFailed {
            command: "sass a.scss a.css".to_string(),
            status: "exit status: 65".to_string(),
            stderr: "Error: expected \";\"\n".to_string(),
        };

        let ctx = user_friendly_error(error.into());
        assert_eq!(ctx.details.as_deref(), Some("Error: expected \";\""));
    }

    #[test]
    fn test_user_friendly_error_generic_includes_chain() {
        let result: Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let error = result.context("outer").unwrap_err();

        let ctx = user_friendly_error(error);
        match ctx.error {
            PagewrightError::Other {
                message,
            } => {
                assert!(message.contains("outer"));
                assert!(message.contains("Caused by:"));
            }
            _ => panic!("Expected Other"),
        }
    }

    #[test]
    fn test_error_clone_downgrades_io() {
        let error = PagewrightError::IoError(std::io::Error::other("disk"));
        match error.clone() {
            PagewrightError::Other {
                message,
            } => assert!(message.contains("disk")),
            _ => panic!("Expected Other"),
        }
    }
}
