//! # clapi Library
//!
//! File: cli/src/lib.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! clapi wraps external executables behind callable objects. Calling a
//! `Wrapper` runs its command with the call's arguments appended and yields
//! the captured output as an ordered list of prefixed lines, so shelling out
//! to small CLI tools reads like calling native async functions.
//!
//! ## Architecture
//!
//! - `wrapper`: the callable surface (`Wrapper`, `Method`, `PendingCall`)
//!   and the dispatch engine behind it.
//! - `common::process`: the process capability (`ProcessHost`,
//!   `ProcessHandle`) and its Tokio implementation, `NativeHost`.
//! - `core`: configuration loading and error types.
//!
//! The `clapi` binary built from this crate exposes one-shot calls and
//! interactive persistent sessions on top of the same API.
//!
pub mod common;
pub mod core;
pub mod wrapper;

pub use crate::common::process::{
    ExecOutput, HostOptions, NativeHost, ProcessEvent, ProcessHandle, ProcessHost, SpawnOptions,
    SpawnedProcess,
};
pub use crate::core::error::{CallResult, ClapiError};
pub use crate::wrapper::buffer::{noop_sink, tracing_sink, LineSink, OutputBuffer};
pub use crate::wrapper::call::PendingCall;
pub use crate::wrapper::format::{LineFormatter, RawOutput};
pub use crate::wrapper::state::{CallStatus, ProcessState};
pub use crate::wrapper::{Method, Wrapper, WrapperOptions};
