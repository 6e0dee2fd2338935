//! Length masking and per-sequence reduction

use crate::autograd::{mul, sum_segments, Tensor};

/// `[batch · time_steps]` mask with 1.0 where `t < lengths[b]`, 0.0 elsewhere.
///
/// Lengths beyond `time_steps` are capped.
pub fn length_mask(lengths: &[usize], time_steps: usize) -> Tensor {
    let data = lengths
        .iter()
        .flat_map(|&len| (0..time_steps).map(move |t| if t < len { 1.0 } else { 0.0 }))
        .collect();
    Tensor::from_vec(data, false)
}

/// Zeroes masked positions of a `[batch · time_steps]` tensor and sums each
/// sequence over time, giving `[batch]`.
pub fn masked_sequence_sum(
    per_token: &Tensor,
    mask: &Tensor,
    batch: usize,
    time_steps: usize,
) -> Tensor {
    sum_segments(&mul(per_token, mask), batch, time_steps)
}
