//! Row gather with scatter-add backward

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Gather rows `ids` of a `vocab × dim` table: `[ids.len() · dim]`
///
/// Ids must already be validated against `vocab`. The backward pass
/// scatter-adds into the table, so repeated ids accumulate.
pub fn embedding_lookup(weight: &Tensor, ids: &[u32], vocab: usize, dim: usize) -> Tensor {
    assert_eq!(weight.len(), vocab * dim, "embedding_lookup: table is not vocab * dim");
    let table = weight.values();
    let mut data = Vec::with_capacity(ids.len() * dim);
    for &id in ids {
        let row = id as usize;
        assert!(row < vocab, "embedding_lookup: id {row} >= vocab {vocab}");
        data.extend_from_slice(&table[row * dim..(row + 1) * dim]);
    }
    let requires_grad = weight.requires_grad();

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(LookupBackward {
            weight: weight.clone(),
            ids: ids.to_vec(),
            dim,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct LookupBackward {
    weight: Tensor,
    ids: Vec<u32>,
    dim: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for LookupBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.weight.requires_grad() {
                let mut grad_w = Array1::zeros(self.weight.len());
                for (i, &id) in self.ids.iter().enumerate() {
                    let row = id as usize * self.dim;
                    for d in 0..self.dim {
                        grad_w[row + d] += grad[i * self.dim + d];
                    }
                }
                self.weight.accumulate_grad(grad_w);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.weight.clone()]
    }
}
