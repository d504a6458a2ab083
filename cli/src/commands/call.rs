//! # clapi Call Handler
//!
//! File: cli/src/commands/call.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements `clapi call`: wrap a command, dispatch it once in
//! exec mode, and print the captured lines. It is the command-line form of
//! `Wrapper::call` / `Wrapper::send`.
//!
//! - Resolved lines go to stdout and the process exits 0.
//! - A rejection (stderr output, or the command could not be run) prints
//!   every captured line to stderr and exits 1.
//! - A non-zero exit status without stderr output still counts as success.
//!
//! ## Usage
//!
//! ```bash
//! # Prefixed output
//! clapi --prefix "echo: " call echo -- hello, world
//!
//! # Sub-command form: runs `git status --short`
//! clapi call --method status git -- --short
//!
//! # Run in another directory
//! clapi call -C /tmp ls
//! ```
//!
use anyhow::anyhow;
use clap::Parser;
use clapi::core::error::Result;
use clapi::ClapiError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Arguments for `clapi call`.
#[derive(Parser, Debug)]
#[command(
    about = "Run a command once and print its captured lines",
    long_about = "Wraps COMMAND, runs `COMMAND [METHOD] ARGS...` through the shell and prints\n\
                  the captured lines. Output on stderr makes the call fail."
)]
pub struct CallArgs {
    /// Sub-command inserted between COMMAND and ARGS.
    #[arg(short, long)]
    method: Option<String>,

    /// Directory the command runs in.
    #[arg(short = 'C', long)]
    workdir: Option<PathBuf>,

    /// The executable (or shell text) to wrap.
    command: String,

    /// Arguments appended to the command, given after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

pub async fn handle_call(args: CallArgs, prefix: Option<String>) -> Result<()> {
    info!("Handling call command...");
    debug!("Call args: {:?}", args);

    let wrapper = super::build_wrapper(&args.command, false, prefix, args.workdir.clone())?;
    let pending = match &args.method {
        Some(method) => wrapper.send(method, args.args.iter().cloned()),
        None => wrapper.call(args.args.iter().cloned()),
    };
    let result = pending.await;
    wrapper.destroy().await;

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
        Err(ClapiError::Rejected { lines }) => {
            for line in &lines {
                eprintln!("{}", line);
            }
            Err(anyhow!("'{}' was rejected", args.command))
        }
        Err(other) => Err(anyhow!(other)),
    }
}
