//! Command-line interface for pagewright.
//!
//! # Available Commands
//!
//! - `bundle` - Generate bundler entry files listing each template's scripts
//! - `render` - Render one template, running its providers, and print the HTML
//!
//! # Global Options
//!
//! - `--settings <FILE>` - Settings file (also `$PAGEWRIGHT_SETTINGS`;
//!   default `./pagewright.toml`)
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//!
//! ```bash
//! # One entry file per app, at {app}/scripts/__entry__.js
//! pagewright bundle
//!
//! # One file for two apps, replacing a previous run
//! pagewright bundle --overwrite --single static/bundle.js homepage account
//!
//! # Render a template to stdout
//! pagewright render homepage/index.html --var title=Welcome
//! ```
//!
//! `RUST_LOG` overrides the level chosen by `--verbose`/`--quiet`, for
//! example `RUST_LOG=compile=debug`.

mod bundle;
mod render;

pub use bundle::BundleCommand;
pub use render::RenderCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{SETTINGS_ENV_VAR, Settings};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit settings file, if any
    pub settings: Option<PathBuf>,
    /// Suppress status output
    pub quiet: bool,
}

impl GlobalOptions {
    /// Loads and validates the settings.
    ///
    /// # Errors
    ///
    /// Unreadable or invalid settings, or a missing or invalid `base_dir`
    pub async fn load_settings(&self) -> Result<Settings> {
        let settings = Settings::load_with_optional(self.settings.clone()).await?;
        settings.validate()?;
        Ok(settings)
    }
}

/// View dispatch and template rendering with per-template asset providers.
#[derive(Parser)]
#[command(
    name = "pagewright",
    about = "Template rendering with per-template asset providers",
    version,
    long_about = "pagewright renders templates through a provider pipeline that compiles stylesheets, \
                  links page assets and generates bundler entry files."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the settings file
    #[arg(long, global = true, value_name = "FILE", env = SETTINGS_ENV_VAR)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bundler entry files from the `webpack` provider group.
    ///
    /// See [`BundleCommand`] for options.
    Bundle(BundleCommand),

    /// Render a template to stdout.
    ///
    /// See [`RenderCommand`] for options.
    Render(RenderCommand),
}

impl Cli {
    /// Installs logging and runs the subcommand.
    ///
    /// # Errors
    ///
    /// Whatever the subcommand returns
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let options = GlobalOptions {
            settings: self.settings,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Bundle(cmd) => cmd.execute_with_options(&options).await,
            Commands::Render(cmd) => cmd.execute_with_options(&options).await,
        }
    }

    /// Log level selected by the flags: debug, error or info.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_level()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .try_init();
    }
}
