//! Directory creation helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensures a directory exists, creating it and any missing parents.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, or if the path exists
/// but is not a directory.
///
/// # Examples
///
/// ```rust,no_run
/// use pagewright::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("static/homepage/styles"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
///
/// Used before compiling into a target file or writing a generated entry file.
/// A path without a parent (a bare file name) is accepted as-is.
///
/// # Examples
///
/// ```rust,no_run
/// use pagewright::utils::fs::ensure_parent_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_parent_dir(Path::new("homepage/styles/index.css"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    Ok(())
}
