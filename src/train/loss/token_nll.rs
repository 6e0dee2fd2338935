//! Fused log-softmax and target gather

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Per-position negative log-likelihood of `targets` under row-wise
/// `softmax(logits)`.
///
/// `logits` is `rows × vocab`, `targets` has one id per row; returns `[rows]`.
/// Backward: `∂/∂logits = (softmax - onehot(target)) · g_row`.
///
/// # Example
///
/// ```
/// use centinela::train::loss::token_nll;
/// use centinela::Tensor;
///
/// let logits = Tensor::from_vec(vec![0.0; 2 * 4], false);
/// let nll = token_nll(&logits, &[1, 3], 2, 4);
/// assert!((nll.data()[0] - 4.0f32.ln()).abs() < 1e-6);
/// ```
pub fn token_nll(logits: &Tensor, targets: &[u32], rows: usize, vocab: usize) -> Tensor {
    assert_eq!(logits.len(), rows * vocab, "token_nll: logits are not rows * vocab");
    assert_eq!(targets.len(), rows, "token_nll: one target per row required");

    let values = logits.values();
    let mut probs = vec![0.0f32; rows * vocab];
    let mut nll = Vec::with_capacity(rows);

    for (r, &target) in targets.iter().enumerate() {
        let row = &values[r * vocab..(r + 1) * vocab];
        let target = target as usize;
        assert!(target < vocab, "token_nll: target {target} >= vocab {vocab}");

        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let total: f32 = row.iter().map(|&x| (x - max).exp()).sum();
        let log_norm = max + total.ln();

        for (p, &x) in probs[r * vocab..(r + 1) * vocab].iter_mut().zip(row) {
            *p = (x - log_norm).exp();
        }
        nll.push(log_norm - row[target]);
    }

    let requires_grad = logits.requires_grad();
    let mut result = Tensor::from_vec(nll, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(TokenNllBackward {
            logits: logits.clone(),
            probs: Array1::from(probs),
            targets: targets.to_vec(),
            vocab,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct TokenNllBackward {
    logits: Tensor,
    probs: Array1<f32>,
    targets: Vec<u32>,
    vocab: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for TokenNllBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.logits.requires_grad() {
                let mut grad_logits = self.probs.clone();
                for (r, &target) in self.targets.iter().enumerate() {
                    let g = grad[r];
                    let row = r * self.vocab;
                    grad_logits[row + target as usize] -= 1.0;
                    for v in 0..self.vocab {
                        grad_logits[row + v] *= g;
                    }
                }
                self.logits.accumulate_grad(grad_logits);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.logits.clone()]
    }
}
