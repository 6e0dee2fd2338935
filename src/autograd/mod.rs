//! Tape-based autograd engine
//!
//! Every differentiable op records a [`BackwardOp`] on its output tensor.
//! [`backward`] walks the recorded graph from a root in reverse topological
//! order, so intermediates shared across time steps (recurrent state) or across
//! heads (the tied embedding) pass on their gradient exactly once.
//!
//! ```
//! use centinela::autograd::{backward, matmul, sum, Tensor};
//!
//! let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
//! let b = Tensor::from_vec(vec![0.5, -1.0], true);
//! let mut loss = sum(&matmul(&a, &b, 2, 2, 1));
//! backward(&mut loss, None);
//! assert!(a.grad().is_some());
//! ```

mod backward;
mod context;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::BackwardOp;
pub use context::Context;
pub use ops::*;
pub use tensor::Tensor;

/// Perform backward pass on a tensor
///
/// Seeds the root gradient with `grad_output`, or ones for a scalar loss.
pub fn backward(tensor: &mut Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    if let Some(grad) = grad_output {
        tensor.set_grad(grad);
    } else {
        let ones = ndarray::Array1::ones(tensor.data().len());
        tensor.set_grad(ones);
    }

    backward::run_backward(tensor);
}
