//! Gradient clipping

use crate::Tensor;

/// Clip gradients by global norm on borrowed parameter references.
///
/// global_norm = √(Σ ‖gᵢ‖²); when it exceeds `max_norm` every gradient is
/// scaled by `max_norm / global_norm`, preserving relative magnitudes.
///
/// Returns the global norm before clipping.
pub fn clip_grad_norm_refs(params: &mut [&mut Tensor], max_norm: f32) -> f32 {
    let total_norm_sq: f32 = params
        .iter()
        .filter_map(|param| param.grad())
        .map(|grad| grad.iter().map(|&g| g * g).sum::<f32>())
        .sum();

    let global_norm = total_norm_sq.sqrt();

    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        for param in params.iter_mut() {
            if let Some(grad) = param.grad() {
                param.set_grad(grad * clip_coef);
            }
        }
    }

    global_norm
}
