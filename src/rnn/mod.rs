//! LSTM language model with an optional pointer-sentinel cache
//!
//! - `embedding`: tied token table (`Embedding`)
//! - `cell` / `encoder`: stacked, length-masked LSTM (`SequenceEncoder`)
//! - `sentinel` / `output`: vocabulary head and cache mixture (`OutputDistribution`)
//! - `model`: the per-episode facade (`LstmLanguageModel`)

mod cell;
mod config;
mod embedding;
mod encoder;
mod model;
mod output;
mod sampler;
mod sentinel;
mod state;

pub use cell::{LstmCell, FORGET_BIAS};
pub use config::ModelConfig;
pub use embedding::Embedding;
pub use encoder::{EncoderOutput, SequenceEncoder};
pub use model::{EpisodeModel, ForwardPass, LstmLanguageModel};
pub use output::{mix, stable_log, Distribution, OutputDistribution, LOG_EPSILON};
pub use sampler::{ArgmaxSampler, Sampler, TemperatureSampler};
pub use sentinel::{scatter_to_vocab, CacheScorer, CacheScores, PointerSentinel};
pub use state::{LayerState, RecurrentState};

use crate::autograd::Tensor;
use rand::rngs::StdRng;
use rand::Rng;

/// Trainable tensor drawn uniformly from `[-scale, scale]`.
pub(crate) fn uniform_param(len: usize, scale: f32, rng: &mut StdRng) -> Tensor {
    let data = (0..len).map(|_| rng.random_range(-scale..=scale)).collect();
    Tensor::from_vec(data, true)
}
