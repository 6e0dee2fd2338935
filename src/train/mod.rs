//! Episodic training
//!
//! - [`loss`]: length-masked sequence NLL
//! - [`EpisodeTrainer`]: epochs over a list of episodes with held-out evaluation
//!
//! # Example
//!
//! ```no_run
//! use centinela::data::load_episodes;
//! use centinela::rnn::{LstmLanguageModel, ModelConfig};
//! use centinela::train::EpisodeTrainer;
//!
//! let episodes = load_episodes("episodes.json")?;
//! let model = LstmLanguageModel::new(ModelConfig::default())?;
//! let mut trainer = EpisodeTrainer::new(model, 10);
//! let result = trainer.fit(&episodes, &[], 5)?;
//! println!("best loss {:.4}", result.best_loss);
//! # Ok::<(), centinela::Error>(())
//! ```

pub mod loss;
mod trainer;

pub use loss::{SequenceLoss, SequenceNll};
pub use trainer::{EpisodeTrainer, EpochMetrics, TrainResult};
