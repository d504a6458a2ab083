//! # clapi Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout clapi. There are two
//! layers:
//! - `ClapiError`: a typed enum (via `thiserror`) returned by wrapper calls and
//!   by the process host. Callers match on it, most importantly on
//!   `ClapiError::Rejected`, whose payload is every line captured for the call.
//! - `Result<T>`: an alias for `anyhow::Result<T>` used by application-level
//!   code (configuration loading, CLI handlers) where adding context matters
//!   more than the exact error type.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use clapi::{ClapiError, Wrapper, WrapperOptions};
//!
//! # async fn run() {
//! let ls = Wrapper::new("ls", WrapperOptions::default());
//! match ls.call(["--no-such-flag"]).await {
//!     Ok(lines) => println!("{}", lines.join("\n")),
//!     // Rejections carry everything captured so far, not a single message.
//!     Err(ClapiError::Rejected { lines }) => eprintln!("{}", lines.join("\n")),
//!     Err(other) => eprintln!("dispatch failed: {other}"),
//! }
//! # }
//! ```
//!
use std::io;
use thiserror::Error;

/// Custom error type for clapi.
#[derive(Error, Debug)]
pub enum ClapiError {
    /// The call produced error-stream output or an OS-level failure.
    #[error("Command rejected:\n{}", lines.join("\n"))]
    Rejected { lines: Vec<String> },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write to process input: {0}")]
    Write(#[source] io::Error),

    #[error("Wrapper instance was destroyed before the call could run.")]
    Destroyed,

    #[error("No Tokio runtime is available to dispatch the call.")]
    NoRuntime,

    #[error("Dispatcher stopped before answering the call.")]
    DispatcherGone,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClapiError {
    /// Lines carried by a rejection, empty for every other variant.
    pub fn lines(&self) -> &[String] {
        match self {
            ClapiError::Rejected { lines } => lines,
            _ => &[],
        }
    }
}

/// Outcome of a single dispatched call: the captured lines or the reason it failed.
pub type CallResult = std::result::Result<Vec<String>, ClapiError>;

/// Type alias for Result using anyhow::Error for application-level code.
pub type Result<T> = anyhow::Result<T>;
