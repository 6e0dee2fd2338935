//! Declarative run configuration
//!
//! A run is described by a YAML file:
//!
//! ```yaml
//! model:
//!   vocab_size: 128
//!   embedding_size: 64
//!   hidden_size: 64
//!   time_steps: 40
//!   use_sentinel: "true"
//! data:
//!   train: episodes/train.json
//!   held_out: episodes/test.json
//! training:
//!   epochs: 5
//! sampling:
//!   num_steps: 30
//!   temperature: 0.8
//! ```

pub mod cli;
mod loader;
mod schema;
pub mod validate;

pub use cli::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, SampleArgs, TrainArgs, ValidateArgs,
};
pub use loader::{load_config, parse_config};
pub(crate) use schema::deserialize_bool_lenient;
pub use schema::{DataSpec, RunSpec, SamplingSpec, TrainingSpec};
pub use validate::{validate_config, ValidationError};
