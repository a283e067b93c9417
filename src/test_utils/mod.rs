//! Test utilities for pagewright
//!
//! Helpers for building throwaway projects on disk and for turning on
//! logging inside tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagewright::test_utils::ProjectBuilder;
//!
//! # fn example() -> anyhow::Result<()> {
//! let project = ProjectBuilder::new()?
//!     .with_app("homepage")
//!     .with_provider("webpack", "js_link")
//!     .with_template("homepage", "index.html", "<p>hi</p>")
//!     .with_script("homepage", "index")
//!     .build()?;
//!
//! assert!(project.exists("pagewright.toml"));
//! # Ok(())
//! # }
//! ```

pub mod builder;

pub use builder::{ProjectBuilder, TestProject};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=provider=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show targets like "provider" and "compile"
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
