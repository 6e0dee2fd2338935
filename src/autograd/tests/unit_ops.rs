//! Unit tests for individual operations and the reverse pass

use crate::autograd::*;
use approx::assert_abs_diff_eq;
use ndarray::Array1;

#[test]
fn test_add_forward_and_backward() {
    let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
    let b = Tensor::from_vec(vec![4.0, 5.0, 6.0], true);
    let mut c = add(&a, &b);

    assert_eq!(c.data().to_vec(), vec![5.0, 7.0, 9.0]);

    backward(&mut c, None);
    assert_eq!(a.grad().unwrap().to_vec(), vec![1.0, 1.0, 1.0]);
    assert_eq!(b.grad().unwrap().to_vec(), vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_scale_and_sum() {
    let a = Tensor::from_vec(vec![1.0, -2.0, 3.0], true);
    let mut s = sum(&scale(&a, 2.0));
    assert_abs_diff_eq!(s.item(), 4.0);

    backward(&mut s, None);
    assert_eq!(a.grad().unwrap().to_vec(), vec![2.0, 2.0, 2.0]);
}

#[test]
fn test_shared_node_gradient_counted_once_per_use() {
    // y = x * x, z = sum(y + y)  =>  dz/dx = 4x
    let x = Tensor::from_vec(vec![1.0, -2.0, 0.5], true);
    let y = mul(&x, &x);
    let mut z = sum(&add(&y, &y));

    backward(&mut z, None);

    let grad = x.grad().unwrap();
    assert_abs_diff_eq!(grad[0], 4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(grad[1], -8.0, epsilon = 1e-6);
    assert_abs_diff_eq!(grad[2], 2.0, epsilon = 1e-6);
}

#[test]
fn test_deep_chain_does_not_overflow_stack() {
    let x = Tensor::from_vec(vec![1.0], true);
    let mut y = x.clone();
    for _ in 0..2_000 {
        y = scale(&y, 1.0);
    }
    backward(&mut y, None);
    assert_abs_diff_eq!(x.grad().unwrap()[0], 1.0);
}

#[test]
fn test_detached_tensor_receives_no_gradient() {
    let a = Tensor::from_vec(vec![1.0, 2.0], true);
    let frozen = a.detach();
    let mut out = sum(&mul(&frozen, &a));
    backward(&mut out, None);

    assert!(frozen.grad().is_none());
    assert_eq!(a.grad().unwrap().to_vec(), vec![1.0, 2.0]);
}

#[test]
fn test_sigmoid_values() {
    let a = Tensor::from_vec(vec![0.0, 100.0, -100.0], false);
    let y = sigmoid(&a);
    assert_abs_diff_eq!(y.data()[0], 0.5);
    assert_abs_diff_eq!(y.data()[1], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(y.data()[2], 0.0, epsilon = 1e-6);
    assert!(y.data().iter().all(|v| v.is_finite()));
}

#[test]
fn test_softmax_large_logits_stable() {
    let a = Tensor::from_vec(vec![1000.0, 1000.0], false);
    let y = softmax(&a);
    assert_abs_diff_eq!(y.data()[0], 0.5);
    assert_abs_diff_eq!(y.data()[1], 0.5);
}

#[test]
fn test_masked_softmax_fully_masked_row_is_zero() {
    let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
    let mask = [false, false, true, true];
    let mut y = masked_softmax_rows(&a, &mask, 2, 2);

    assert_eq!(&y.data().to_vec()[..2], &[0.0, 0.0]);
    let row_sum: f32 = y.data().iter().skip(2).sum();
    assert_abs_diff_eq!(row_sum, 1.0, epsilon = 1e-6);

    backward(&mut y, Some(Array1::from(vec![1.0, 2.0, 3.0, 4.0])));
    let grad = a.grad().unwrap();
    assert_eq!(grad[0], 0.0);
    assert_eq!(grad[1], 0.0);
}

#[test]
fn test_log_floor_clamps() {
    let a = Tensor::from_vec(vec![0.0, 1.0], true);
    let mut y = log_floor(&a, 1e-10);
    assert_abs_diff_eq!(y.data()[0], (1e-10f32).ln());
    assert_abs_diff_eq!(y.data()[1], 0.0);

    backward(&mut y, None);
    let grad = a.grad().unwrap();
    assert_eq!(grad[0], 0.0);
    assert_abs_diff_eq!(grad[1], 1.0);
}

#[test]
fn test_matmul_2x2() {
    let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
    let b = Tensor::from_vec(vec![5.0, 6.0, 7.0, 8.0], true);
    let mut c = matmul(&a, &b, 2, 2, 2);
    assert_eq!(c.data().to_vec(), vec![19.0, 22.0, 43.0, 50.0]);

    backward(&mut c, None);
    // dA = 1 @ Bᵀ, each row = row sums of B
    assert_eq!(a.grad().unwrap().to_vec(), vec![11.0, 15.0, 11.0, 15.0]);
    // dB = Aᵀ @ 1, each column = column sums of A
    assert_eq!(b.grad().unwrap().to_vec(), vec![4.0, 4.0, 6.0, 6.0]);
}

#[test]
fn test_embedding_lookup_scatters_repeated_ids() {
    let weight = Tensor::from_vec(vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0], true);
    let mut rows = embedding_lookup(&weight, &[2, 2, 0], 3, 2);
    assert_eq!(rows.data().to_vec(), vec![2.0, 2.0, 2.0, 2.0, 0.0, 0.0]);

    backward(&mut rows, None);
    assert_eq!(weight.grad().unwrap().to_vec(), vec![1.0, 1.0, 0.0, 0.0, 2.0, 2.0]);
}

#[test]
fn test_stack_steps_layout() {
    // two steps, batch of two, width one
    let t0 = Tensor::from_vec(vec![1.0, 2.0], false);
    let t1 = Tensor::from_vec(vec![3.0, 4.0], false);
    let stacked = stack_steps(&[t0, t1], 2, 1);
    assert_eq!(stacked.data().to_vec(), vec![1.0, 3.0, 2.0, 4.0]);
}

#[test]
fn test_concat_cols_and_slice_cols_inverse() {
    let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], false);
    let b = Tensor::from_vec(vec![9.0, 8.0], false);
    let joined = concat_cols(&a, &b, 2, 2, 1);
    assert_eq!(joined.data().to_vec(), vec![1.0, 2.0, 9.0, 3.0, 4.0, 8.0]);

    let left = slice_cols(&joined, 2, 3, 0, 2);
    let right = slice_cols(&joined, 2, 3, 2, 1);
    assert_eq!(left.data(), a.data());
    assert_eq!(right.data(), b.data());
}

#[test]
fn test_scale_rows_and_sum_segments() {
    let m = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], false);
    let f = Tensor::from_vec(vec![2.0, 0.5], false);
    let scaled = scale_rows(&m, &f, 2, 2);
    assert_eq!(scaled.data().to_vec(), vec![2.0, 4.0, 1.5, 2.0]);

    let sums = sum_segments(&scaled, 2, 2);
    assert_eq!(sums.data().to_vec(), vec![6.0, 3.5]);
}

#[test]
fn test_add_row_bias_accumulates_bias_gradient() {
    let m = Tensor::from_vec(vec![0.0; 6], false);
    let bias = Tensor::from_vec(vec![1.0, 2.0], true);
    let mut out = add_row_bias(&m, &bias, 3, 2);
    assert_eq!(out.data().to_vec(), vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);

    backward(&mut out, None);
    assert_eq!(bias.grad().unwrap().to_vec(), vec![3.0, 3.0]);
}
