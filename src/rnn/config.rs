//! Model configuration

use crate::config::deserialize_bool_lenient;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters of the language model.
///
/// Every field is recognised in the `model:` block of a run specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Vocabulary size V
    pub vocab_size: usize,
    /// Embedding dimension E; must equal `hidden_size` (tied output projection)
    pub embedding_size: usize,
    /// Hidden dimension H of every recurrent layer
    pub hidden_size: usize,
    /// Number of stacked recurrent layers
    pub n_layers: usize,
    /// Fixed time window T
    pub time_steps: usize,
    /// Blend the vocabulary softmax with the pointer-sentinel cache
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub use_sentinel: bool,
    pub start_token: u32,
    pub stop_token: u32,
    pub learning_rate: f32,
    /// Global-norm clipping threshold
    pub max_grad_norm: f32,
    /// Parameters start uniform in `[-init_scale, init_scale]`
    pub init_scale: f32,
    pub seed: u64,
    /// Cap on scored positions per sequence during evaluation
    pub eval_max_len: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vocab_size: 64,
            embedding_size: 32,
            hidden_size: 32,
            n_layers: 1,
            time_steps: 32,
            use_sentinel: false,
            start_token: 1,
            stop_token: 2,
            learning_rate: 1e-3,
            max_grad_norm: 5.0,
            init_scale: 0.1,
            seed: 42,
            eval_max_len: None,
        }
    }
}

impl ModelConfig {
    /// Tiny configuration for tests and smoke runs
    pub fn tiny(vocab_size: usize, hidden_size: usize, time_steps: usize) -> Self {
        Self {
            vocab_size,
            embedding_size: hidden_size,
            hidden_size,
            time_steps,
            ..Self::default()
        }
    }

    /// Check internal consistency. Called by the model constructor.
    pub fn validate(&self) -> Result<()> {
        if self.embedding_size != self.hidden_size {
            return Err(Error::config(
                "embedding_size",
                format!(
                    "{} != hidden_size {} but the output projection is tied to the embedding",
                    self.embedding_size, self.hidden_size
                ),
                "set embedding_size and hidden_size to the same value",
            ));
        }
        if self.hidden_size == 0 {
            return Err(Error::config("hidden_size", "must be positive", "use e.g. 128"));
        }
        if self.n_layers == 0 {
            return Err(Error::config("n_layers", "must be at least 1", "use n_layers: 1"));
        }
        if self.time_steps < 2 {
            return Err(Error::config(
                "time_steps",
                format!("{} leaves no room for the start and stop tokens", self.time_steps),
                "use time_steps >= 2",
            ));
        }
        for (field, token) in [("start_token", self.start_token), ("stop_token", self.stop_token)] {
            if token as usize >= self.vocab_size {
                return Err(Error::config(
                    field,
                    format!("id {token} is outside the vocabulary of size {}", self.vocab_size),
                    "raise vocab_size or pick an id below it",
                ));
            }
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::config("learning_rate", "must be positive", "use e.g. 0.001"));
        }
        if !(self.max_grad_norm > 0.0) {
            return Err(Error::config("max_grad_norm", "must be positive", "use e.g. 5.0"));
        }
        if !(self.init_scale > 0.0) {
            return Err(Error::config("init_scale", "must be positive", "use e.g. 0.1"));
        }
        if self.eval_max_len == Some(0) {
            return Err(Error::config(
                "eval_max_len",
                "must be positive when set",
                "remove it or use a positive cap",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
        assert!(ModelConfig::tiny(10, 4, 6).validate().is_ok());
    }

    #[test]
    fn test_untied_dimensions_rejected() {
        let config = ModelConfig { embedding_size: 16, hidden_size: 32, ..ModelConfig::default() };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { ref field, .. } if field == "embedding_size"));
    }

    #[test]
    fn test_tokens_must_be_in_vocabulary() {
        let config = ModelConfig { stop_token: 64, ..ModelConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_layers_and_short_window_rejected() {
        assert!(ModelConfig { n_layers: 0, ..ModelConfig::default() }.validate().is_err());
        assert!(ModelConfig { time_steps: 1, ..ModelConfig::default() }.validate().is_err());
        assert!(ModelConfig { learning_rate: 0.0, ..ModelConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "vocab_size: 100\nuse_sentinel: true\n";
        let config: ModelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.vocab_size, 100);
        assert!(config.use_sentinel);
        assert_eq!(config.hidden_size, 32);
    }
}
