//! YAML schema for a training run

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::rnn::ModelConfig;

/// Deserialize a bool from either a YAML boolean (`true`) or a quoted string (`"true"`).
pub(crate) fn deserialize_bool_lenient<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => match s.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected 'true' or 'false', got '{other}'"
            ))),
        },
    }
}

/// Complete run specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Model hyperparameters
    #[serde(default)]
    pub model: ModelConfig,

    /// Episode files
    pub data: DataSpec,

    /// Epoch loop settings
    #[serde(default)]
    pub training: TrainingSpec,

    /// Decoding settings for the `sample` command
    #[serde(default)]
    pub sampling: SamplingSpec,
}

/// Episode data locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    /// JSON file of training episodes
    pub train: PathBuf,

    /// Optional JSON file of held-out episodes, evaluated after every epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held_out: Option<PathBuf>,
}

/// Epoch loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSpec {
    /// Passes over the training episodes
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Episodes between progress lines
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            log_interval: default_log_interval(),
        }
    }
}

fn default_epochs() -> usize {
    10
}

fn default_log_interval() -> usize {
    10
}

/// Decoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingSpec {
    /// Tokens to generate after the start token
    #[serde(default = "default_num_steps")]
    pub num_steps: usize,

    /// Softmax temperature; greedy decoding when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Seed of the temperature sampler
    #[serde(default)]
    pub seed: u64,
}

impl Default for SamplingSpec {
    fn default() -> Self {
        Self {
            num_steps: default_num_steps(),
            temperature: None,
            seed: 0,
        }
    }
}

fn default_num_steps() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_spec_fills_defaults() {
        let spec: RunSpec = serde_yaml::from_str("data:\n  train: train.json\n").unwrap();
        assert_eq!(spec.model, ModelConfig::default());
        assert_eq!(spec.training, TrainingSpec::default());
        assert_eq!(spec.sampling.num_steps, 20);
        assert!(spec.data.held_out.is_none());
    }

    #[test]
    fn test_sentinel_flag_accepts_quoted_bool() {
        let yaml = "model:\n  use_sentinel: \"true\"\ndata:\n  train: t.json\n";
        let spec: RunSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(spec.model.use_sentinel);

        let yaml = "model:\n  use_sentinel: false\ndata:\n  train: t.json\n";
        let spec: RunSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(!spec.model.use_sentinel);
    }

    #[test]
    fn test_sentinel_flag_rejects_other_strings() {
        let yaml = "model:\n  use_sentinel: \"yes\"\ndata:\n  train: t.json\n";
        assert!(serde_yaml::from_str::<RunSpec>(yaml).is_err());
    }

    #[test]
    fn test_missing_data_block_is_an_error() {
        assert!(serde_yaml::from_str::<RunSpec>("model:\n  hidden_size: 8\n").is_err());
    }
}
