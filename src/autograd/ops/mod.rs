//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod lookup;
mod matmul;
mod shape;

pub use activations::{
    log_floor, masked_softmax_rows, sigmoid, softmax, softmax_rows, tanh,
};
pub use basic::{add, mul, scale, sub, sum};
pub use lookup::embedding_lookup;
pub use matmul::{matmul, matmul_compute, matmul_nt, transpose};
pub use shape::{
    add_row_bias, concat, concat_cols, scale_rows, slice, slice_cols, stack_steps, sum_segments,
};
