//! Layout autograd operations: slicing, concatenation, broadcasting

use crate::autograd::{BackwardOp, Tensor};
use ndarray::{s, Array1};
use std::cell::RefCell;
use std::rc::Rc;

/// Contiguous range `[start, start + len)` of a tensor
pub fn slice(a: &Tensor, start: usize, len: usize) -> Tensor {
    assert!(start + len <= a.len(), "slice: range out of bounds");
    let data = a.data().slice(s![start..start + len]).to_owned();
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SliceBackward {
            a: a.clone(),
            rows: 1,
            cols: a.len(),
            start,
            width: len,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

/// Columns `[start, start + width)` of a `rows × cols` matrix
pub fn slice_cols(a: &Tensor, rows: usize, cols: usize, start: usize, width: usize) -> Tensor {
    assert_eq!(a.len(), rows * cols, "slice_cols: tensor is not rows * cols");
    assert!(start + width <= cols, "slice_cols: column range out of bounds");
    let input = a.values();
    let mut data = Vec::with_capacity(rows * width);
    for r in 0..rows {
        data.extend_from_slice(&input[r * cols + start..r * cols + start + width]);
    }
    let requires_grad = a.requires_grad();

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SliceBackward {
            a: a.clone(),
            rows,
            cols,
            start,
            width,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SliceBackward {
    a: Tensor,
    rows: usize,
    cols: usize,
    start: usize,
    width: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SliceBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let mut grad_a = Array1::zeros(self.rows * self.cols);
                for r in 0..self.rows {
                    for c in 0..self.width {
                        grad_a[r * self.cols + self.start + c] = grad[r * self.width + c];
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

/// Concatenate tensors end to end
pub fn concat(parts: &[Tensor]) -> Tensor {
    let data: Vec<f32> = parts.iter().flat_map(|p| p.values().iter().copied()).collect();
    let requires_grad = parts.iter().any(Tensor::requires_grad);

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(ConcatBackward {
            parts: parts.to_vec(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct ConcatBackward {
    parts: Vec<Tensor>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for ConcatBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let mut offset = 0;
            for part in &self.parts {
                if part.requires_grad() {
                    part.accumulate_grad(grad.slice(s![offset..offset + part.len()]).to_owned());
                }
                offset += part.len();
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        self.parts.clone()
    }
}

/// Side-by-side concatenation of `rows × ca` and `rows × cb` matrices
pub fn concat_cols(a: &Tensor, b: &Tensor, rows: usize, ca: usize, cb: usize) -> Tensor {
    assert_eq!(a.len(), rows * ca, "concat_cols: left operand is not rows * ca");
    assert_eq!(b.len(), rows * cb, "concat_cols: right operand is not rows * cb");
    let (left, right) = (a.values(), b.values());
    let mut data = Vec::with_capacity(rows * (ca + cb));
    for r in 0..rows {
        data.extend_from_slice(&left[r * ca..(r + 1) * ca]);
        data.extend_from_slice(&right[r * cb..(r + 1) * cb]);
    }
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(ConcatColsBackward {
            a: a.clone(),
            b: b.clone(),
            rows,
            ca,
            cb,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct ConcatColsBackward {
    a: Tensor,
    b: Tensor,
    rows: usize,
    ca: usize,
    cb: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for ConcatColsBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let width = self.ca + self.cb;
            if self.a.requires_grad() {
                let grad_a: Array1<f32> = (0..self.rows * self.ca)
                    .map(|i| grad[(i / self.ca) * width + i % self.ca])
                    .collect();
                self.a.accumulate_grad(grad_a);
            }
            if self.b.requires_grad() {
                let grad_b: Array1<f32> = (0..self.rows * self.cb)
                    .map(|i| grad[(i / self.cb) * width + self.ca + i % self.cb])
                    .collect();
                self.b.accumulate_grad(grad_b);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

/// Interleave per-step `batch × width` outputs into `batch × steps × width`
pub fn stack_steps(steps: &[Tensor], batch: usize, width: usize) -> Tensor {
    for step in steps {
        assert_eq!(step.len(), batch * width, "stack_steps: step is not batch * width");
    }
    let n_steps = steps.len();
    let mut data = vec![0.0f32; batch * n_steps * width];
    for (t, step) in steps.iter().enumerate() {
        let values = step.values();
        for b in 0..batch {
            let dst = (b * n_steps + t) * width;
            data[dst..dst + width].copy_from_slice(&values[b * width..(b + 1) * width]);
        }
    }
    let requires_grad = steps.iter().any(Tensor::requires_grad);

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(StackStepsBackward {
            steps: steps.to_vec(),
            batch,
            width,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct StackStepsBackward {
    steps: Vec<Tensor>,
    batch: usize,
    width: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for StackStepsBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let n_steps = self.steps.len();
            for (t, step) in self.steps.iter().enumerate() {
                if !step.requires_grad() {
                    continue;
                }
                let mut grad_step = Array1::zeros(self.batch * self.width);
                for b in 0..self.batch {
                    let src = (b * n_steps + t) * self.width;
                    for w in 0..self.width {
                        grad_step[b * self.width + w] = grad[src + w];
                    }
                }
                step.accumulate_grad(grad_step);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        self.steps.clone()
    }
}

/// Add a `cols`-vector to every row of a `rows × cols` matrix
pub fn add_row_bias(a: &Tensor, bias: &Tensor, rows: usize, cols: usize) -> Tensor {
    assert_eq!(a.len(), rows * cols, "add_row_bias: tensor is not rows * cols");
    assert_eq!(bias.len(), cols, "add_row_bias: bias is not cols long");
    let bias_values = bias.values();
    let data: Array1<f32> = a
        .data()
        .iter()
        .enumerate()
        .map(|(i, &x)| x + bias_values[i % cols])
        .collect();
    let requires_grad = a.requires_grad() || bias.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(RowBiasBackward {
            a: a.clone(),
            bias: bias.clone(),
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct RowBiasBackward {
    a: Tensor,
    bias: Tensor,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for RowBiasBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad.clone());
            }
            if self.bias.requires_grad() {
                let mut grad_bias = Array1::zeros(self.cols);
                for (i, &g) in grad.iter().enumerate() {
                    grad_bias[i % self.cols] += g;
                }
                self.bias.accumulate_grad(grad_bias);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.bias.clone()]
    }
}

/// Multiply row `r` of a `rows × cols` matrix by `factors[r]`
pub fn scale_rows(a: &Tensor, factors: &Tensor, rows: usize, cols: usize) -> Tensor {
    assert_eq!(a.len(), rows * cols, "scale_rows: tensor is not rows * cols");
    assert_eq!(factors.len(), rows, "scale_rows: one factor per row required");
    let f = factors.values();
    let data: Array1<f32> =
        a.data().iter().enumerate().map(|(i, &x)| x * f[i / cols]).collect();
    let requires_grad = a.requires_grad() || factors.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(ScaleRowsBackward {
            a: a.clone(),
            factors: factors.clone(),
            rows,
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct ScaleRowsBackward {
    a: Tensor,
    factors: Tensor,
    rows: usize,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for ScaleRowsBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let f = self.factors.values();
                let grad_a: Array1<f32> =
                    grad.iter().enumerate().map(|(i, &g)| g * f[i / self.cols]).collect();
                self.a.accumulate_grad(grad_a);
            }
            if self.factors.requires_grad() {
                let a = self.a.values();
                let grad_f: Array1<f32> = (0..self.rows)
                    .map(|r| {
                        (0..self.cols)
                            .map(|c| grad[r * self.cols + c] * a[r * self.cols + c])
                            .sum::<f32>()
                    })
                    .collect();
                self.factors.accumulate_grad(grad_f);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.factors.clone()]
    }
}

/// Sum each consecutive run of `segment` elements: `[n·segment] -> [n]`
pub fn sum_segments(a: &Tensor, segments: usize, segment: usize) -> Tensor {
    assert_eq!(a.len(), segments * segment, "sum_segments: tensor is not segments * segment");
    let values = a.values();
    let data: Array1<f32> =
        (0..segments).map(|i| values[i * segment..(i + 1) * segment].iter().sum::<f32>()).collect();
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SumSegmentsBackward {
            a: a.clone(),
            segment,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SumSegmentsBackward {
    a: Tensor,
    segment: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SumSegmentsBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let grad_a: Array1<f32> =
                    (0..self.a.len()).map(|i| grad[i / self.segment]).collect();
                self.a.accumulate_grad(grad_a);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
