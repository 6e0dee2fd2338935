//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! centinela train run.yaml
//! centinela train run.yaml --epochs 3 --lr 0.01 --trace
//! centinela validate run.yaml --detailed
//! centinela info run.yaml
//! centinela sample run.yaml --steps 40 --temperature 0.7
//! ```

mod core;

pub use core::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, SampleArgs, TrainArgs, ValidateArgs,
};
