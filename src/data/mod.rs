//! Episode data: raw token groups, the input/target adapter and file loading

mod adapter;
mod episode;

pub use adapter::{convert_tokens_to_input_and_target, TokenBatch, PAD_TOKEN};
pub use episode::{load_episodes, Episode, SequenceGroup};
