//! File metadata helpers: modification times and staleness comparison.
//!
//! Compile providers decide whether to recompile by comparing the modification
//! time of a source file with that of its compiled target. Link providers use
//! the modification time as a cache-busting version in emitted URLs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagewright::utils::fs::{is_stale, modified_version};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let source = Path::new("homepage/styles/index.scss");
//! let target = Path::new("homepage/styles/index.css");
//! if is_stale(source, target)? {
//!     // recompile
//! }
//! let version = modified_version(target)?;
//! println!("index.css?{version}");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Gets the modification time of a file.
///
/// # Errors
/// Returns an error if the file metadata cannot be read
pub fn get_modified_time(path: &Path) -> Result<SystemTime> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;

    metadata
        .modified()
        .with_context(|| format!("Failed to get modification time for: {}", path.display()))
}

/// Returns true when `target` must be regenerated from `source`.
///
/// - missing source: `false` (nothing to compile from)
/// - missing target: `true`
/// - both present: `true` only when the source is strictly newer
///
/// # Errors
/// Returns an error if an existing file's metadata cannot be read
pub fn is_stale(source: &Path, target: &Path) -> Result<bool> {
    if !source.exists() {
        return Ok(false);
    }
    if !target.exists() {
        return Ok(true);
    }

    let source_time = get_modified_time(source)?;
    let target_time = get_modified_time(target)?;
    Ok(source_time > target_time)
}

/// Modification time as whole seconds since the epoch, for cache-busting URLs.
///
/// # Errors
/// Returns an error if the file metadata cannot be read
pub fn modified_version(path: &Path) -> Result<u64> {
    let modified = get_modified_time(path)?;
    Ok(modified.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0))
}
