//! Compiled-asset providers.
//!
//! A compile provider keeps a generated file (usually CSS) in step with its
//! source (SCSS, LESS, anything with a command-line compiler). On construction
//! it decides, in order:
//!
//! 1. already checked in this process (non-debug only): do nothing
//! 2. source missing: nothing to compile, provider disabled
//! 3. target missing or older than the source: compile
//! 4. otherwise: up to date
//!
//! The "already checked" memo lives in a [`StalenessTracker`] owned by the
//! factory, so it survives across renders and is shared by every template that
//! resolves to the same source file.

use anyhow::Result;
use dashmap::DashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    KIND_COMPILE, KIND_COMPILE_LESS, KIND_COMPILE_SCSS, OptionValue, Provider, ProviderContext,
    ProviderFactory, RunContext, STYLES_GROUP,
};
use crate::command::CompilerCommand;
use crate::core::PagewrightError;
use crate::template::TemplateId;
use crate::utils::fs::{ensure_parent_dir, is_stale};

/// Per-source check state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked {
        source_exists: bool,
    },
}

/// Thread-safe memo of source files already checked by one factory.
///
/// Each source path gets its own lock. The first render to reach a source
/// holds it while checking (and compiling); concurrent renders of templates
/// sharing that source wait, then see it checked.
#[derive(Debug, Default)]
pub struct StalenessTracker {
    entries: DashMap<PathBuf, Arc<Mutex<CheckState>>>,
}

impl StalenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, source: &Path) -> Arc<Mutex<CheckState>> {
        Arc::clone(&self.entries.entry(source.to_path_buf()).or_default())
    }

    pub fn state(&self, source: &Path) -> CheckState {
        self.entries.get(source).map(|slot| *lock(&slot)).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every check, so the next render re-examines all sources.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

fn lock(slot: &Mutex<CheckState>) -> MutexGuard<'_, CheckState> {
    // A panic mid-compile leaves the state untouched, which is still valid
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which compiler defaults a compile provider uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileFlavor {
    /// No defaults: `sourcepath`, `targetpath` and `command` must be configured
    Generic,
    Scss,
    Less,
}

impl CompileFlavor {
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Generic => KIND_COMPILE,
            Self::Scss => KIND_COMPILE_SCSS,
            Self::Less => KIND_COMPILE_LESS,
        }
    }

    const fn source_extension(self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::Scss => Some("scss"),
            Self::Less => Some("less"),
        }
    }

    fn default_source(self, ctx: &ProviderContext<'_>) -> Option<String> {
        let ext = self.source_extension()?;
        Some(format!("{}/styles/{}.{ext}", ctx.app_dir()?, ctx.template.stem()))
    }

    fn default_target(self, ctx: &ProviderContext<'_>) -> Option<String> {
        self.source_extension()?;
        Some(format!("{}/styles/{}.css", ctx.app_dir()?, ctx.template.stem()))
    }

    fn default_command(
        self,
        ctx: &ProviderContext<'_>,
        source: &Path,
        target: &Path,
    ) -> Result<Option<Vec<String>>> {
        let source = source.display().to_string();
        let target = target.display().to_string();
        Ok(match self {
            Self::Generic => None,
            Self::Scss => {
                let base_dir = ctx.settings.base_dir()?;
                Some(vec![
                    locate("sass"),
                    "--source-map".to_string(),
                    format!("--load-path={}", base_dir.display()),
                    source,
                    target,
                ])
            }
            Self::Less => Some(vec![locate("lessc"), "--source-map".to_string(), source, target]),
        })
    }
}

/// Full path of `program` on PATH, or the bare name when it cannot be found.
fn locate(program: &str) -> String {
    which::which(program).map(|path| path.display().to_string()).unwrap_or_else(|_| program.to_string())
}

/// What a compile provider did when it was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Checked by an earlier render; no filesystem access this time
    CheckedEarlier,
    SourceMissing,
    UpToDate,
    Compiled,
}

impl fmt::Display for CompileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CheckedEarlier => "already checked",
            Self::SourceMissing => "nonexistent",
            Self::UpToDate => "already up to date",
            Self::Compiled => "compiled",
        })
    }
}

/// Keeps a compiled file up to date with its source.
#[derive(Debug)]
pub struct CompileProvider {
    flavor: CompileFlavor,
    group: String,
    template: TemplateId,
    sourcepath: PathBuf,
    targetpath: PathBuf,
    outcome: CompileOutcome,
    enabled: bool,
}

impl CompileProvider {
    /// Resolves paths, consults the tracker and compiles when needed.
    ///
    /// # Errors
    ///
    /// - [`PagewrightError::MissingOption`] when a path or command cannot be resolved
    /// - any [`crate::command`] error from the compiler
    pub fn create(flavor: CompileFlavor, ctx: &ProviderContext<'_>, factory: &ProviderFactory) -> Result<Self> {
        let options = factory.options();
        let missing = |option: &str| PagewrightError::MissingOption {
            provider: flavor.kind().to_string(),
            option: option.to_string(),
        };

        let source = ctx
            .resolve(options.sourcepath.as_ref())
            .or_else(|| flavor.default_source(ctx))
            .ok_or_else(|| missing("sourcepath"))?;
        let target = ctx
            .resolve(options.targetpath.as_ref())
            .or_else(|| flavor.default_target(ctx))
            .ok_or_else(|| missing("targetpath"))?;
        let sourcepath = ctx.asset_path(&source)?;
        let targetpath = ctx.asset_path(&target)?;

        let debug = ctx.settings.debug;
        let slot = factory.tracker().slot(&sourcepath);
        let mut state = lock(&slot);

        let (outcome, enabled) = match *state {
            CheckState::Checked {
                source_exists,
            } if !debug => (CompileOutcome::CheckedEarlier, source_exists),
            _ if !sourcepath.exists() => (CompileOutcome::SourceMissing, false),
            _ if is_stale(&sourcepath, &targetpath)? => {
                let command = build_command(flavor, ctx, options.command.as_ref(), &sourcepath, &targetpath)?
                    .ok_or_else(|| missing("command"))?;
                ensure_parent_dir(&targetpath)?;
                CompilerCommand::new()
                    .args(command)
                    .with_timeout(ctx.settings.command_timeout())
                    .with_context(ctx.template.name())
                    .execute()?;
                (CompileOutcome::Compiled, true)
            }
            _ => (CompileOutcome::UpToDate, true),
        };

        if outcome != CompileOutcome::CheckedEarlier {
            *state = CheckState::Checked {
                source_exists: enabled,
            };
        }
        drop(state);

        tracing::debug!(
            target: "compile",
            "{} created for {} [{}]",
            flavor.kind(),
            sourcepath.display(),
            outcome
        );

        Ok(Self {
            flavor,
            group: options.group_or(STYLES_GROUP).to_string(),
            template: ctx.template.clone(),
            sourcepath,
            targetpath,
            outcome,
            enabled,
        })
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    pub fn sourcepath(&self) -> &Path {
        &self.sourcepath
    }

    pub fn targetpath(&self) -> &Path {
        &self.targetpath
    }

    pub const fn outcome(&self) -> CompileOutcome {
        self.outcome
    }
}

/// Configured command with `{source}`/`{target}` expanded, else the flavor default.
/// An empty configured command counts as unset.
fn build_command(
    flavor: CompileFlavor,
    ctx: &ProviderContext<'_>,
    configured: Option<&OptionValue<Vec<String>>>,
    source: &Path,
    target: &Path,
) -> Result<Option<Vec<String>>> {
    let configured = configured.map(|value| match value {
        OptionValue::Literal(args) => {
            let source = source.display().to_string();
            let target = target.display().to_string();
            args.iter()
                .map(|arg| {
                    super::options::expand_placeholders(
                        &ctx.expand(arg),
                        &[("source", &source), ("target", &target)],
                    )
                })
                .collect()
        }
        OptionValue::Computed(compute) => compute(ctx),
    });

    match configured {
        Some(args) if !args.is_empty() => Ok(Some(args)),
        _ => flavor.default_command(ctx, source, target),
    }
}

impl Provider for CompileProvider {
    fn kind(&self) -> &str {
        self.flavor.kind()
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

pub(crate) fn create_compile(
    ctx: &ProviderContext<'_>,
    factory: &ProviderFactory,
    _run: &mut RunContext,
) -> Result<Box<dyn Provider>> {
    Ok(Box::new(CompileProvider::create(CompileFlavor::Generic, ctx, factory)?))
}

pub(crate) fn create_compile_scss(
    ctx: &ProviderContext<'_>,
    factory: &ProviderFactory,
    _run: &mut RunContext,
) -> Result<Box<dyn Provider>> {
    Ok(Box::new(CompileProvider::create(CompileFlavor::Scss, ctx, factory)?))
}

pub(crate) fn create_compile_less(
    ctx: &ProviderContext<'_>,
    factory: &ProviderFactory,
    _run: &mut RunContext,
) -> Result<Box<dyn Provider>> {
    Ok(Box::new(CompileProvider::create(CompileFlavor::Less, ctx, factory)?))
}
