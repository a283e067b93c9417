//! Atomic file writes using a temp-and-rename strategy.
//!
//! Generated entry files are picked up by file watchers in bundler dev
//! servers, which must never see a half-written file.

use crate::utils::fs::dirs::ensure_parent_dir;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes a string to `path` atomically.
///
/// Convenience wrapper around [`atomic_write`].
///
/// # Examples
///
/// ```rust,no_run
/// use pagewright::utils::fs::safe_write;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// safe_write(Path::new("homepage/scripts/__entry__.js"), "(context => {})(PAGEWRIGHT_CONTEXT.get());")?;
/// # Ok(())
/// # }
/// ```
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Writes bytes to `path` atomically.
///
/// The content goes to a sibling `.tmp` file first, is synced to disk and is
/// then renamed over the target. Readers see either the old file or the new
/// one. Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or any of the
/// write, sync or rename steps fails
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;

    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;
        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
