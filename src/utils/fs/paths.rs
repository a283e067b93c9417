//! Path utilities for normalization, containment checks and relative paths.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components.
///
/// This is a logical operation: it does not touch the filesystem or resolve
/// symbolic links.
///
/// # Examples
///
/// ```rust,no_run
/// use pagewright::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// let path = Path::new("/project/./homepage/../account/scripts");
/// assert_eq!(normalize_path(path), PathBuf::from("/project/account/scripts"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {} // Skip .
            Component::ParentDir => {
                components.pop(); // Remove previous component for ..
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Returns true if `path` is `base` itself or lies below it, after normalization.
///
/// Used to prune discovered script files to the apps being bundled.
#[must_use]
pub fn is_within(base: &Path, path: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(base))
}

/// Computes the path of `target` relative to the directory `from_dir`.
///
/// Both paths are normalized first. When they share no common prefix (different
/// roots or drives), `target` is returned unchanged.
///
/// # Examples
///
/// ```rust,no_run
/// use pagewright::utils::fs::relative_path;
/// use std::path::{Path, PathBuf};
///
/// let rel = relative_path(Path::new("/p/homepage/scripts"), Path::new("/p/account/scripts/login.js"));
/// assert_eq!(rel, PathBuf::from("../../account/scripts/login.js"));
/// ```
#[must_use]
pub fn relative_path(from_dir: &Path, target: &Path) -> PathBuf {
    let from = normalize_path(from_dir);
    let to = normalize_path(target);

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts.iter().zip(&to_parts).take_while(|(a, b)| a == b).count();
    if common == 0 && (from.has_root() || to.has_root()) {
        return to;
    }

    let mut result = PathBuf::new();
    for _ in common..from_parts.len() {
        result.push("..");
    }
    for part in &to_parts[common..] {
        result.push(part.as_os_str());
    }
    result
}

/// Renders a path with forward slashes, as used in URLs and `require()` calls.
#[must_use]
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir => Some(String::new()),
            Component::CurDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
