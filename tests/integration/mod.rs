//! Integration test suite for sitegen
//!
//! End-to-end tests that drive the `sitegen` binary against temporary site
//! directories.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **build**: `sitegen build` over a whole site
//! - **render**: `sitegen render` to stdout and to files
//! - **check**: `sitegen check` over a templates directory

use assert_cmd::Command;
use sitegen::test_utils::TestSite;

mod build;
mod check;
mod render;

/// A `sitegen` command running in the site root with logging unset.
pub fn sitegen(site: &TestSite) -> Command {
    let mut cmd = Command::cargo_bin("sitegen").unwrap();
    cmd.current_dir(&site.root).env_remove("RUST_LOG");
    cmd
}
