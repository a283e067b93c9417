//! Cross-platform utilities and helpers
//!
//! - [`fs`] - Directory creation, modification-time checks and path helpers

pub mod fs;

pub use fs::{ensure_dir, ensure_parent_dir, normalize_path};
