//! Reverse pass over the recorded graph

use crate::autograd::Tensor;
use std::collections::HashSet;
use std::rc::Rc;

/// Local gradient rule of one recorded operation.
///
/// `backward` reads the op's output gradient and accumulates the contribution
/// into each input's gradient cell. It must not recurse: the traversal in
/// [`run_backward`] decides the order.
pub trait BackwardOp {
    fn backward(&self);

    /// Tensors this op was computed from.
    fn inputs(&self) -> Vec<Tensor>;
}

/// Runs every op reachable from `root` so that a node is processed only after
/// all of its consumers have contributed to its gradient.
pub(crate) fn run_backward(root: &Tensor) {
    for op in reverse_topological(root) {
        op.backward();
    }
}

/// Ops in post-order (inputs first), reversed. Iterative so long recurrent
/// chains do not exhaust the stack.
fn reverse_topological(root: &Tensor) -> Vec<Rc<dyn BackwardOp>> {
    let mut visited = HashSet::new();
    let mut order: Vec<Rc<dyn BackwardOp>> = Vec::new();
    // (tensor, inputs already expanded)
    let mut stack: Vec<(Tensor, bool)> = vec![(root.clone(), false)];

    while let Some((tensor, expanded)) = stack.pop() {
        let Some(op) = tensor.backward_op() else {
            continue;
        };
        if expanded {
            order.push(op);
            continue;
        }
        if !visited.insert(tensor.id()) {
            continue;
        }
        stack.push((tensor, true));
        for input in op.inputs() {
            if input.backward_op().is_some() && !visited.contains(&input.id()) {
                stack.push((input, false));
            }
        }
    }

    order.reverse();
    order
}
