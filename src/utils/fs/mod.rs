//! File system utilities
//!
//! Small helpers shared by the compile providers, the link providers and the
//! bundle command:
//!
//! - [`atomic`]: temp-and-rename writes
//! - [`dirs`]: directory creation
//! - [`metadata`]: modification times and staleness checks
//! - [`paths`]: normalization, containment and relative paths

pub mod atomic;
pub mod dirs;
pub mod metadata;
pub mod paths;

pub use atomic::{atomic_write, safe_write};
pub use dirs::{ensure_dir, ensure_parent_dir};
pub use metadata::{get_modified_time, is_stale, modified_version};
pub use paths::{is_within, normalize_path, relative_path, to_forward_slashes};
