//! Validation error types

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Training data path does not exist: {0}")]
    TrainDataNotFound(String),

    #[error("Held-out data path does not exist: {0}")]
    HeldOutDataNotFound(String),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid gradient clip value: {0} (must be > 0.0)")]
    InvalidGradClip(f32),

    #[error("Invalid time steps: {0} (must be >= 2)")]
    InvalidTimeSteps(usize),

    #[error("Invalid log interval: {0} (must be > 0)")]
    InvalidLogInterval(usize),

    #[error("Invalid sampling temperature: {0} (must be > 0.0)")]
    InvalidTemperature(f32),

    #[error("Invalid model block: {0}")]
    Model(String),
}
