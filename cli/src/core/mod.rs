//! # clapi Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the infrastructure shared by the wrapper engine and
//! the CLI:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and the application-level `Result` alias
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{ClapiError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
