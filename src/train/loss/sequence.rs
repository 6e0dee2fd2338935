//! Length-masked sequence loss

use super::{length_mask, masked_sequence_sum, token_nll};
use crate::autograd::{scale, sum, Tensor};
use crate::error::{Error, Result};

/// Both reductions of one forward pass.
#[derive(Debug, Clone)]
pub struct SequenceNll {
    /// Total negative log-likelihood of each sequence, `[batch]`
    pub per_sequence: Tensor,
    /// Batch mean of `per_sequence`, a scalar tensor
    pub mean: Tensor,
}

impl SequenceNll {
    pub fn per_sequence_values(&self) -> Vec<f32> {
        self.per_sequence.data().to_vec()
    }

    pub fn mean_value(&self) -> f32 {
        self.mean.item()
    }
}

/// Negative log-likelihood over `[batch, time_steps, vocab]` logits.
///
/// A sequence of length L receives exactly L per-token terms, whatever
/// the padding beyond L holds.
#[derive(Debug, Clone, Copy)]
pub struct SequenceLoss {
    vocab_size: usize,
    time_steps: usize,
}

impl SequenceLoss {
    pub fn new(vocab_size: usize, time_steps: usize) -> Self {
        Self { vocab_size, time_steps }
    }

    /// Compute the per-sequence and batch-mean NLL.
    ///
    /// `lengths` must lie in `1..=time_steps`; `targets` holds
    /// `batch · time_steps` ids.
    pub fn forward(
        &self,
        logits: &Tensor,
        targets: &[u32],
        lengths: &[usize],
    ) -> Result<SequenceNll> {
        let batch = lengths.len();
        let (t_steps, vocab) = (self.time_steps, self.vocab_size);

        if batch == 0 {
            return Err(Error::EmptySet("loss batch"));
        }
        if targets.len() != batch * t_steps {
            return Err(Error::shape("loss targets", vec![batch, t_steps], vec![targets.len()]));
        }
        if logits.len() != batch * t_steps * vocab {
            return Err(Error::shape(
                "loss logits",
                vec![batch, t_steps, vocab],
                vec![logits.len()],
            ));
        }
        for (index, &length) in lengths.iter().enumerate() {
            if length == 0 || length > t_steps {
                return Err(Error::InvalidLength { index, length, max: t_steps });
            }
        }
        if let Some(&token) = targets.iter().find(|&&t| t as usize >= vocab) {
            return Err(Error::TokenOutOfRange { token, vocab_size: vocab });
        }

        let per_token = token_nll(logits, targets, batch * t_steps, vocab);
        let mask = length_mask(lengths, t_steps);
        let per_sequence = masked_sequence_sum(&per_token, &mask, batch, t_steps);
        let mean = scale(&sum(&per_sequence), 1.0 / batch as f32);

        Ok(SequenceNll { per_sequence, mean })
    }

    pub fn name(&self) -> &'static str {
        "SequenceNLL"
    }
}
