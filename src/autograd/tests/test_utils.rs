//! Test utilities for gradient checking

use crate::autograd::{backward, Tensor};

/// Finite difference gradient checker
///
/// Computes numerical gradient using central difference:
/// f'(x) ≈ (f(x + h) - f(x - h)) / (2h)
pub fn finite_difference<F>(f: F, x: &[f32], epsilon: f32) -> Vec<f32>
where
    F: Fn(&[f32]) -> f32,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + epsilon;
        x_minus[i] = x[i] - epsilon;

        let f_plus = f(&x_plus);
        let f_minus = f(&x_minus);

        grad[i] = (f_plus - f_minus) / (2.0 * epsilon);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }

    grad
}

/// Weighted-sum loss: L = Σ wᵢ yᵢ with fixed non-uniform weights, so that
/// ops whose outputs sum to a constant (softmax) still get a non-trivial check.
pub fn loss_weights(len: usize) -> Vec<f32> {
    (0..len).map(|i| ((i as f32) * 0.7).sin() + 1.1).collect()
}

/// Analytical gradient of `Σ wᵢ op(x)ᵢ` with respect to `x`.
pub fn analytical_gradient<F>(op: F, x: &[f32]) -> Vec<f32>
where
    F: Fn(&Tensor) -> Tensor,
{
    let input = Tensor::from_vec(x.to_vec(), true);
    let mut output = op(&input);
    let weights = loss_weights(output.len());
    backward(&mut output, Some(ndarray::Array1::from(weights)));
    input.grad().expect("gradient should be available").to_vec()
}

/// Numerical gradient of the same weighted sum.
pub fn numerical_gradient<F>(op: F, x: &[f32], epsilon: f32) -> Vec<f32>
where
    F: Fn(&Tensor) -> Tensor,
{
    finite_difference(
        |x_val| {
            let out = op(&Tensor::from_vec(x_val.to_vec(), false));
            let weights = loss_weights(out.len());
            out.data().iter().zip(&weights).map(|(y, w)| y * w).sum()
        },
        x,
        epsilon,
    )
}
