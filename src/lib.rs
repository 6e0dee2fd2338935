//! Centinela: episodic LSTM language model with a pointer-sentinel cache.
//!
//! The crate provides:
//! - [`autograd`]: a small tape-based reverse-mode engine over flat `f32` tensors
//! - [`rnn`]: the stacked LSTM encoder, weight-tied output head, optional
//!   pointer-sentinel cache and the [`rnn::LstmLanguageModel`] facade
//! - [`train`]: length-masked sequence NLL and an epoch loop over episodes
//! - [`eval`]: NDCG of true continuations against distractors
//! - [`data`]: episodes and the start/stop-token adapter
//! - [`optim`]: Adam with global-norm clipping
//! - [`config`] and [`cli`]: YAML run specifications and the `centinela` binary
//!
//! # Example
//!
//! ```
//! use centinela::data::{Episode, SequenceGroup};
//! use centinela::rnn::{EpisodeModel, LstmLanguageModel, ModelConfig};
//!
//! let mut model = LstmLanguageModel::new(ModelConfig::tiny(10, 4, 6))?;
//! let episode = Episode {
//!     support: vec![SequenceGroup::from_sequences(vec![vec![3, 4, 5]])],
//!     query: vec![SequenceGroup::from_sequences(vec![vec![3, 4]])],
//!     other_query: vec![SequenceGroup::from_sequences(vec![vec![8, 9]])],
//! };
//! let loss = model.train(&episode)?;
//! let nll = model.eval(&episode)?;
//! let ndcg = model.eval_ranking(&episode)?;
//! assert!(loss.is_finite() && nll.is_finite());
//! assert!((0.0..=1.0).contains(&ndcg));
//! # Ok::<(), centinela::Error>(())
//! ```

pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod optim;
pub mod rnn;
pub mod trace;
pub mod train;

pub use autograd::Tensor;
pub use error::{Error, Result};
