//! # clapi Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared infrastructure that sits below the wrapper engine. Today this is the
//! process capability: the traits the engine consumes to run commands and the
//! Tokio-backed host that implements them.
//!

/// Process capability traits and the native Tokio host.
pub mod process;
