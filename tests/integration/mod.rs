//! Integration test suite for pagewright
//!
//! End-to-end tests of the `pagewright` binary and of the library's
//! render and dispatch paths against projects laid out on disk.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **bundle**: `pagewright bundle` entry files, overwrite refusal, app selection
//! - **compile**: compile providers memoizing across renders
//! - **dispatch**: router and controller against real templates
//! - **render**: `pagewright render` and settings errors

use assert_cmd::Command;
use pagewright::test_utils::TestProject;

mod bundle;
mod compile;
mod dispatch;
mod render;

/// `pagewright` run from the project root with its settings file, isolated
/// from the caller's environment.
fn pagewright(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("pagewright").unwrap();
    cmd.current_dir(project.root())
        .env_remove("PAGEWRIGHT_SETTINGS")
        .env_remove("PAGEWRIGHT_DEBUG")
        .env_remove("RUST_LOG")
        .arg("--settings")
        .arg(project.settings_path());
    cmd
}
