//! Configuration management for pagewright
//!
//! A project is described by a single `pagewright.toml` file: where the project
//! and its collected static files live, which apps are registered, routing
//! defaults, and the provider groups that run for every template.
//!
//! # Modules
//!
//! - `settings` - The [`Settings`] file format, loading and path resolution
//!
//! # Lookup
//!
//! 1. `--settings <path>` on the command line
//! 2. `$PAGEWRIGHT_SETTINGS`
//! 3. `./pagewright.toml`
//!
//! `$PAGEWRIGHT_DEBUG` overrides the file's `debug` flag, so a production
//! settings file can be used for local development without editing it.

mod settings;

pub use settings::{
    AppConfig, DEBUG_ENV_VAR, SETTINGS_ENV_VAR, SETTINGS_FILE_NAME, Settings,
};
