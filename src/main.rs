//! Centinela CLI
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! centinela train run.yaml
//!
//! # Train with overrides and a timing report
//! centinela train run.yaml --epochs 10 --lr 0.01 --trace
//!
//! # Validate config
//! centinela validate run.yaml
//!
//! # Show config info
//! centinela info run.yaml
//!
//! # Train briefly, then decode from the start token
//! centinela sample run.yaml --steps 30 --temperature 0.8
//! ```
//!
//! Library diagnostics are emitted through `tracing`; set `RUST_LOG=centinela=debug`
//! to see per-episode loss events.

use clap::Parser;
use centinela::cli::{run_command, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "centinela=info"
    } else {
        "centinela=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
