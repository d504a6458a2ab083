//! # clapi CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration test files (`call.rs`, `session.rs`,
//! etc.). Each `.rs` file in `cli/tests/` is compiled as its own test crate;
//! the ones that drive the binary declare `mod common;` to reach these.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use tempfile::TempDir;

/// # Get clapi Command (`clapi_cmd`)
///
/// Creates an `assert_cmd::Command` pointing to the compiled `clapi` binary
/// for the current test run.
///
/// ## Panics
/// Panics if the `clapi` binary cannot be found via `Command::cargo_bin`.
pub fn clapi_cmd() -> Command {
    Command::cargo_bin("clapi").expect("Failed to find clapi binary for testing")
}

/// # Isolated clapi Command (`isolated_clapi_cmd`)
///
/// Like `clapi_cmd`, but runs inside `dir` with the user config directory
/// pointed at `dir` too, so no real configuration file leaks into the test.
pub fn isolated_clapi_cmd(dir: &TempDir) -> Command {
    let mut cmd = clapi_cmd();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("RUST_LOG");
    cmd
}
