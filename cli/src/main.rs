//! # clapi Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `clapi` binary.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Architecture
//!
//! The wrapper engine lives in the `clapi` library crate; the binary only adds
//! the `commands` module on top of it:
//! - Each subcommand (`call`, `session`) is a variant in the `Commands` enum
//! - Handlers receive their parsed arguments plus the global `--prefix`
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! clapi --help
//!
//! # One-shot call with a prefix and debug logging
//! clapi -vv --prefix "ls: " call ls -- -1
//!
//! # Feed a persistent process from stdin
//! printf '2+2\n' | clapi session bc -- -q
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "clapi",
    about = "Call command-line tools like functions",
    long_about = "Wraps an external command, runs it with the given arguments and prints\n\
                  the captured output as prefixed lines.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// String prepended to every captured line (overrides the config file).
    #[arg(long, global = true)]
    prefix: Option<String>,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "c")]
    Call(commands::call::CallArgs),
    #[command(alias = "s")]
    Session(commands::session::SessionArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Call(args) => commands::call::handle_call(args, cli.prefix).await,
        Commands::Session(args) => commands::session::handle_session(args, cli.prefix).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
