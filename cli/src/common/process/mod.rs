//! # clapi Process Capability (`common::process`)
//!
//! File: cli/src/common/process/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the boundary between the wrapper engine and the
//! operating system's process facility. The engine never touches
//! `tokio::process` directly; it consumes two small capability traits:
//!
//! - **`ProcessHost`**: starts processes, either one-shot (`exec`: run a
//!   complete command line, buffer everything, report once) or streaming
//!   (`spawn`: start an executable and hand back a live handle plus a stream of
//!   notifications).
//! - **`ProcessHandle`**: one live process: write to its input, ask whether it
//!   is still connected, and disconnect it.
//!
//! Notifications from a spawned process arrive as `ProcessEvent`s on an
//! unbounded channel: `Stdout`/`Stderr` chunks (line-buffered, each carrying
//! the complete lines available from one read) and exactly one `Exit` after
//! both output streams have closed.
//!
//! ## Architecture
//!
//! - `native`: the Tokio-backed implementation used in production (`NativeHost`).
//! - `fake` (tests only): an in-memory host that records what it was asked to
//!   run and lets tests push notifications by hand.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clapi::{NativeHost, ProcessEvent, ProcessHost, SpawnOptions};
//!
//! # async fn run() -> Result<(), clapi::ClapiError> {
//! let host = NativeHost::default();
//!
//! // One-shot: fully buffered output.
//! let output = host.exec("ls -1", &SpawnOptions::default()).await;
//! println!("{}", output.stdout);
//!
//! // Streaming: write to stdin, read notifications.
//! let mut process = host.spawn("cat", &["-".to_string()], &SpawnOptions::default())?;
//! process.handle.write("hello\n").await?;
//! if let Some(ProcessEvent::Stdout(text)) = process.events.recv().await {
//!     assert_eq!(text, "hello\n");
//! }
//! process.handle.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::ClapiError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

mod native;

#[cfg(test)]
pub(crate) mod fake;

pub use native::{HostOptions, NativeHost};

/// A notification pushed by a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Complete lines read from standard output, newlines included.
    Stdout(String),
    /// Complete lines read from standard error, newlines included.
    Stderr(String),
    /// The process terminated. `None` when it was ended by a signal.
    Exit(Option<i32>),
}

/// Everything a one-shot execution produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// OS-level failure (the command line could not be run at all).
    pub error: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

/// Options applied when starting a process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Working directory of the new process. `None` inherits the caller's.
    pub working_dir: Option<PathBuf>,
}

/// A freshly started streaming process.
pub struct SpawnedProcess {
    pub handle: Box<dyn ProcessHandle>,
    pub events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl std::fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("connected", &self.handle.is_connected())
            .finish_non_exhaustive()
    }
}

/// One live process started by a `ProcessHost`.
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    /// Writes `text` verbatim to the process's input and waits until it is flushed.
    async fn write(&mut self, text: &str) -> Result<(), ClapiError>;

    /// True while the input stream is open and the process has not exited.
    fn is_connected(&self) -> bool;

    /// Closes the input stream and asks the process to end.
    ///
    /// Only call this while `is_connected()` is true; implementations are
    /// not required to be idempotent.
    async fn disconnect(&mut self);
}

/// The OS process facility consumed by the wrapper engine.
#[async_trait]
pub trait ProcessHost: Send + Sync {
    /// Runs a complete command line to completion and buffers its output.
    async fn exec(&self, command_line: &str, options: &SpawnOptions) -> ExecOutput;

    /// Starts `program` with `args`, returning a handle and its notification stream.
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<SpawnedProcess, ClapiError>;
}
