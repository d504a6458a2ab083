//! # clapi Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the subcommands of the `clapi` binary. Each one
//! defines its own `clap` arguments structure and an async handler that
//! `main.rs` routes to.
//!
//! ## Commands
//!
//! - `call`: run one exec-mode call and print its lines
//! - `session`: drive a persistent process line by line from stdin
//!

/// One-shot call of a wrapped command.
pub mod call;
/// Interactive persistent-mode session.
pub mod session;

use anyhow::Context;
use clapi::core::config;
use clapi::core::error::Result;
use clapi::{NativeHost, Wrapper, WrapperOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Builds a wrapper from the loaded configuration and the command-line overrides.
pub(crate) fn build_wrapper(
    command: &str,
    persistent: bool,
    prefix: Option<String>,
    workdir: Option<PathBuf>,
) -> Result<Wrapper> {
    let cfg = config::load_config().context("Failed to load clapi configuration")?;
    let mut options: WrapperOptions = cfg.wrapper_options().with_persistent(persistent);
    if let Some(prefix) = prefix {
        options.prefix = prefix;
    }
    if let Some(dir) = workdir {
        options.working_dir = Some(dir);
    }
    let host = NativeHost::new(cfg.host_options());
    Ok(Wrapper::with_host(command, options, Arc::new(host)))
}
