//! Tests for autograd operations with gradient checking

mod prop_shape;
mod test_utils;
mod unit_ops;
