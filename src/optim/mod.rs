//! Optimizers for training the language model

mod adam;
mod clip;
mod optimizer;

pub use adam::Adam;
pub use clip::clip_grad_norm_refs;
pub use optimizer::Optimizer;
