//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunSpec;

/// Centinela: episodic LSTM language model with a pointer-sentinel cache
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "centinela")]
#[command(version)]
#[command(about = "Episodic LSTM language model with a pointer-sentinel cache and NDCG ranking")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a model from YAML configuration
    Train(TrainArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),

    /// Display information about a configuration
    Info(InfoArgs),

    /// Train, then decode a token sequence from the start token
    Sample(SampleArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override the initialisation seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Dry run (validate config but don't train)
    #[arg(long)]
    pub dry_run: bool,

    /// Print a per-step timing report after training
    #[arg(long)]
    pub trace: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Print the resolved specification as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the sample command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SampleArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override the number of generated tokens
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Override the sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Override the number of training epochs run before decoding
    #[arg(short, long)]
    pub epochs: Option<usize>,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a RunSpec
pub fn apply_overrides(spec: &mut RunSpec, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        spec.model.learning_rate = lr;
    }
    if let Some(seed) = args.seed {
        spec.model.seed = seed;
    }
}
