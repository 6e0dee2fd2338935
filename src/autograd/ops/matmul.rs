//! Matrix multiplication autograd operations
//!
//! Row-major flat buffers, multiplied through `ndarray` views. Instrumented
//! with TRACER.

use crate::autograd::{BackwardOp, Tensor};
use crate::trace::{TraceStep, TRACER};
use ndarray::{Array1, ArrayView2};
use std::cell::RefCell;
use std::rc::Rc;

fn view(data: &[f32], rows: usize, cols: usize) -> ArrayView2<'_, f32> {
    ArrayView2::from_shape((rows, cols), data).expect("matrix buffer length checked by caller")
}

/// Transpose a row-major matrix (rows x cols) to (cols x rows)
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    view(data, rows, cols).t().iter().copied().collect()
}

/// C = A @ B for row-major A (m×k) and B (k×n)
pub fn matmul_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    TRACER.span(TraceStep::Matmul, format!("{m}x{k}x{n}"), || {
        view(a, m, k).dot(&view(b, k, n)).iter().copied().collect()
    })
}

/// C = A @ Bᵗ for row-major A (m×k) and B (n×k)
pub fn matmul_nt_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    TRACER.span(TraceStep::Matmul, format!("{m}x{k}x{n}ᵗ"), || {
        view(a, m, k).dot(&view(b, n, k).t()).iter().copied().collect()
    })
}

/// Matrix multiplication
///
/// Computes C = A @ B where:
/// - A is m×k (flattened to length m*k)
/// - B is k×n (flattened to length k*n)
/// - C is m×n (flattened to length m*n)
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "Matrix A size mismatch");
    assert_eq!(b.len(), k * n, "Matrix B size mismatch");

    let result_data = matmul_compute(a.values(), b.values(), m, k, n);

    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::from_vec(result_data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            transposed_b: false,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

/// Matrix multiplication against a transposed right operand
///
/// Computes C = A @ Bᵗ where A is m×k and B is n×k. This is the tied output
/// projection: hidden states (rows × H) against the embedding (V × H).
pub fn matmul_nt(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "Matrix A size mismatch");
    assert_eq!(b.len(), n * k, "Matrix B size mismatch");

    let result_data = matmul_nt_compute(a.values(), b.values(), m, k, n);

    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::from_vec(result_data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            transposed_b: true,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
    transposed_b: bool,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let (m, k, n) = (self.m, self.k, self.n);
            let grad_c = grad.as_slice().expect("gradient storage is contiguous");

            if self.a.requires_grad() {
                // C = A Bᵀ:  dA = dC B       (m×n · n×k)
                // C = A B:   dA = dC Bᵀ      (m×n · n×k)
                let grad_a = if self.transposed_b {
                    matmul_compute(grad_c, self.b.values(), m, n, k)
                } else {
                    matmul_nt_compute(grad_c, self.b.values(), m, n, k)
                };
                self.a.accumulate_grad(Array1::from(grad_a));
            }

            if self.b.requires_grad() {
                // C = A Bᵀ:  dB = dCᵀ A      (n×m · m×k)
                // C = A B:   dB = Aᵀ dC      (k×m · m×n)
                let grad_b = if self.transposed_b {
                    let grad_c_t = transpose(grad_c, m, n);
                    matmul_compute(&grad_c_t, self.a.values(), n, m, k)
                } else {
                    let a_t = transpose(self.a.values(), m, k);
                    matmul_compute(&a_t, grad_c, k, m, n)
                };
                self.b.accumulate_grad(Array1::from(grad_b));
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_roundtrip_shape() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = transpose(&data, 2, 3);
        assert_eq!(t, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_matmul_nt_matches_explicit_transpose() {
        let a = vec![1.0, 2.0, 3.0, 4.0]; // 2x2
        let b = vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]; // 3x2
        let direct = matmul_nt_compute(&a, &b, 2, 2, 3);
        let via_t = matmul_compute(&a, &transpose(&b, 3, 2), 2, 2, 3);
        assert_eq!(direct, via_t);
        assert_eq!(direct, vec![17.0, 23.0, 29.0, 39.0, 53.0, 67.0]);
    }
}
