//! Error types with actionable diagnostics.
//!
//! Configuration and shape errors are raised at model construction or on the
//! first call that sees a bad batch. Numeric underflow in the sentinel mixture
//! is handled locally by the log floor and never surfaces here.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ValidationError;

/// Result type alias for centinela operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Model configuration is internally inconsistent.
    #[error("Invalid model configuration for '{field}': {message}\n  → {suggestion}")]
    Config { field: String, message: String, suggestion: String },

    /// Run specification failed validation.
    #[error("Invalid run specification: {0}")]
    Validation(#[from] ValidationError),

    /// Tensor or batch dimensions disagree.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { context: String, expected: Vec<usize>, actual: Vec<usize> },

    /// A sequence length is zero or does not fit in the time window.
    #[error("Invalid length {length} for sequence {index}: must be in 1..={max}\n  → Shorten the sequence or raise time_steps")]
    InvalidLength { index: usize, length: usize, max: usize },

    /// A token id falls outside the vocabulary.
    #[error("Token id {token} is outside the vocabulary (size {vocab_size})")]
    TokenOutOfRange { token: u32, vocab_size: usize },

    /// An episode set that must be populated is empty.
    #[error("Episode has no {0} sequences")]
    EmptySet(&'static str),

    /// File could not be read.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration syntax in {path}:\n  {message}")]
    ConfigParsing { path: PathBuf, message: String },

    /// Episode file could not be decoded.
    #[error("Episode data error: {0}")]
    Data(String),
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub(crate) fn config(
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Config { field: field.into(), message: message.into(), suggestion: suggestion.into() }
    }

    pub(crate) fn shape(
        context: impl Into<String>,
        expected: Vec<usize>,
        actual: Vec<usize>,
    ) -> Self {
        Self::ShapeMismatch { context: context.into(), expected, actual }
    }

    /// Errors caused by the caller's input rather than by the environment.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message_has_suggestion() {
        let err = Error::config(
            "hidden_size",
            "64 != embedding_size 32",
            "set both to the same value",
        );
        let msg = err.to_string();
        assert!(msg.contains("hidden_size"));
        assert!(msg.contains("→ set both"));
    }

    #[test]
    fn test_invalid_length_message() {
        let err = Error::InvalidLength { index: 3, length: 0, max: 20 };
        assert!(err.to_string().contains("1..=20"));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_io_error_is_not_user_error() {
        let err = Error::io("reading episodes", std::io::Error::other("disk"));
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("reading episodes"));
    }
}
