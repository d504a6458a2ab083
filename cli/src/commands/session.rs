//! # clapi Session Handler
//!
//! File: cli/src/commands/session.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements `clapi session`: start COMMAND once as a persistent
//! process, then forward stdin to it one line at a time. Each line becomes one
//! call; the lines captured for it are printed before the next line is sent.
//! Rejected calls (the process wrote to stderr) are printed to stderr and the
//! session carries on.
//!
//! When stdin reaches EOF the wrapper is destroyed, which closes the process's
//! input, and anything still buffered (usually the exit line) is printed.
//!
//! ## Usage
//!
//! ```bash
//! printf 'hello\n' | clapi session cat -- -
//! # hello
//! # Child process exited with code 0.
//! ```
//!
//! A line that makes the process print nothing leaves its call waiting until
//! the process prints something or exits.
//!
use anyhow::Context;
use clap::Parser;
use clapi::core::error::Result;
use clapi::{CallResult, ClapiError};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Arguments for `clapi session`.
#[derive(Parser, Debug)]
#[command(
    about = "Drive a persistent process line by line from stdin",
    long_about = "Starts `COMMAND ARGS...` once, writes each stdin line to it and prints the\n\
                  lines it answers with. On EOF the process is disconnected."
)]
pub struct SessionArgs {
    /// Directory the process runs in.
    #[arg(short = 'C', long)]
    workdir: Option<PathBuf>,

    /// The executable to start.
    command: String,

    /// Arguments the process is started with, given after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

pub async fn handle_session(args: SessionArgs, prefix: Option<String>) -> Result<()> {
    info!("Handling session command...");
    debug!("Session args: {:?}", args);

    let wrapper = super::build_wrapper(&args.command, true, prefix, args.workdir.clone())?;
    let mut started = Some(wrapper.call(args.args.iter().cloned()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let pending = wrapper.call([format!("{}\n", line)]);
        // The start call settles no later than the first write.
        if let Some(start) = started.take() {
            report(start.await);
        }
        report(pending.await);
    }

    debug!("stdin closed, destroying session for '{}'", args.command);
    let remaining = wrapper.destroy().await;
    if let Some(start) = started.take() {
        report(start.await);
    }
    for line in remaining {
        println!("{}", line);
    }
    Ok(())
}

fn report(result: CallResult) {
    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(ClapiError::Rejected { lines }) => {
            for line in lines {
                eprintln!("{}", line);
            }
        }
        Err(e) => warn!("Call did not complete: {}", e),
    }
}
