//! Activation function autograd operations: sigmoid, tanh, softmax, log floor

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Numerically stable logistic function.
#[inline]
fn sigmoid_scalar(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Logistic sigmoid
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(sigmoid_scalar);
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SigmoidBackward {
            a: a.clone(),
            output: result.data().clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SigmoidBackward {
    a: Tensor,
    output: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SigmoidBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // σ'(x) = σ(x)(1 - σ(x))
                let local = self.output.mapv(|s| s * (1.0 - s));
                self.a.accumulate_grad(grad * &local);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Hyperbolic tangent
pub fn tanh(a: &Tensor) -> Tensor {
    let data = a.data().mapv(f32::tanh);
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(TanhBackward {
            a: a.clone(),
            output: result.data().clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct TanhBackward {
    a: Tensor,
    output: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for TanhBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let local = self.output.mapv(|t| 1.0 - t * t);
                self.a.accumulate_grad(grad * &local);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Softmax over a single row, in place. Masked entries (`allowed[i] == false`)
/// get probability zero. A row with nothing allowed stays all zero.
fn softmax_row_into(row: &[f32], allowed: Option<&[bool]>, out: &mut [f32]) {
    let is_allowed = |i: usize| allowed.map_or(true, |m| m[i]);
    let max = row
        .iter()
        .enumerate()
        .filter(|(i, _)| is_allowed(*i))
        .fold(f32::NEG_INFINITY, |acc, (_, &v)| acc.max(v));
    if max == f32::NEG_INFINITY {
        out.iter_mut().for_each(|o| *o = 0.0);
        return;
    }
    let mut total = 0.0;
    for (i, (o, &v)) in out.iter_mut().zip(row).enumerate() {
        *o = if is_allowed(i) { (v - max).exp() } else { 0.0 };
        total += *o;
    }
    for o in out.iter_mut() {
        *o /= total;
    }
}

/// Softmax over the whole tensor
pub fn softmax(a: &Tensor) -> Tensor {
    softmax_rows(a, 1, a.len())
}

/// Row-wise softmax of a `rows × cols` matrix
pub fn softmax_rows(a: &Tensor, rows: usize, cols: usize) -> Tensor {
    softmax_impl(a, None, rows, cols)
}

/// Row-wise softmax restricted to the entries where `mask` is true.
///
/// Masked entries are excluded from normalisation and receive zero
/// probability and zero gradient.
pub fn masked_softmax_rows(a: &Tensor, mask: &[bool], rows: usize, cols: usize) -> Tensor {
    assert_eq!(mask.len(), rows * cols, "masked_softmax_rows: mask size mismatch");
    softmax_impl(a, Some(mask), rows, cols)
}

fn softmax_impl(a: &Tensor, mask: Option<&[bool]>, rows: usize, cols: usize) -> Tensor {
    assert_eq!(a.len(), rows * cols, "softmax: tensor is not rows * cols");
    let input = a.values();
    let mut output = vec![0.0f32; rows * cols];
    for r in 0..rows {
        let span = r * cols..(r + 1) * cols;
        let row_mask = mask.map(|m| &m[span.clone()]);
        softmax_row_into(&input[span.clone()], row_mask, &mut output[span]);
    }

    let requires_grad = a.requires_grad();
    let mut result = Tensor::from_vec(output, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SoftmaxBackward {
            a: a.clone(),
            output: result.data().clone(),
            rows,
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SoftmaxBackward {
    a: Tensor,
    output: Array1<f32>,
    rows: usize,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SoftmaxBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂x_i = y_i * (∂L/∂y_i - Σ_j ∂L/∂y_j * y_j), per row.
                // Masked entries have y = 0 and therefore zero gradient.
                let mut grad_a = Array1::zeros(self.rows * self.cols);
                for r in 0..self.rows {
                    let base = r * self.cols;
                    let dot: f32 = (0..self.cols)
                        .map(|c| grad[base + c] * self.output[base + c])
                        .sum();
                    for c in 0..self.cols {
                        let y = self.output[base + c];
                        grad_a[base + c] = y * (grad[base + c] - dot);
                    }
                }
                self.a.accumulate_grad(grad_a);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// `ln(max(x, eps))`, element-wise.
///
/// The gradient is `1/x` where `x > eps` and zero where the floor is active.
pub fn log_floor(a: &Tensor, eps: f32) -> Tensor {
    let data = a.data().mapv(|x| x.max(eps).ln());
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(LogFloorBackward {
            a: a.clone(),
            eps,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct LogFloorBackward {
    a: Tensor,
    eps: f32,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for LogFloorBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let local = self.a.data().mapv(|x| if x > self.eps { 1.0 / x } else { 0.0 });
                self.a.accumulate_grad(grad * &local);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
