//! Sequence negative log-likelihood
//!
//! The loss is assembled from three separately testable pieces:
//!
//! - [`token_nll`] - per-position `-log softmax(logits)[target]`
//! - [`length_mask`] - 1 for positions inside each sequence, 0 for padding
//! - [`masked_sequence_sum`] - masks and reduces over time to one value per sequence
//!
//! [`SequenceLoss`] chains them and yields both reductions ([`SequenceNll`]).

mod mask;
mod sequence;
mod token_nll;

pub use mask::{length_mask, masked_sequence_sum};
pub use sequence::{SequenceLoss, SequenceNll};
pub use token_nll::token_nll;
