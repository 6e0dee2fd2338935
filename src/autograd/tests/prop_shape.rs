//! Property-based tests for layout operations

use super::test_utils::{analytical_gradient, numerical_gradient};
use crate::autograd::{
    add_row_bias, concat, concat_cols, embedding_lookup, scale_rows, slice, slice_cols,
    stack_steps, sum_segments, Tensor,
};
use proptest::prelude::*;

fn check<F>(op: F, x: &[f32]) -> Result<(), TestCaseError>
where
    F: Fn(&Tensor) -> Tensor,
{
    let analytical = analytical_gradient(&op, x);
    let numerical = numerical_gradient(&op, x, 1e-3);
    for i in 0..x.len() {
        prop_assert!((analytical[i] - numerical[i]).abs() < 1e-2,
            "Gradient mismatch at {}: {} vs {}", i, analytical[i], numerical[i]);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_slice_cols_gradient(x in prop::collection::vec(-3.0f32..3.0, 12..13)) {
        check(|t| slice_cols(t, 3, 4, 1, 2), &x)?;
    }

    #[test]
    fn prop_slice_gradient(x in prop::collection::vec(-3.0f32..3.0, 10..11)) {
        check(|t| slice(t, 3, 5), &x)?;
    }

    #[test]
    fn prop_concat_cols_gradient(x in prop::collection::vec(-3.0f32..3.0, 6..7)) {
        let right = Tensor::from_vec(vec![0.5, -0.5, 1.0, 2.0], false);
        check(|t| concat_cols(t, &right, 2, 3, 2), &x)?;
    }

    #[test]
    fn prop_concat_gradient(x in prop::collection::vec(-3.0f32..3.0, 4..5)) {
        let tail = Tensor::from_vec(vec![1.0, 2.0], false);
        check(|t| concat(&[tail.clone(), t.clone(), tail.clone()]), &x)?;
    }

    #[test]
    fn prop_stack_steps_gradient(x in prop::collection::vec(-3.0f32..3.0, 6..7)) {
        let other = Tensor::from_vec(vec![0.1; 6], false);
        check(|t| stack_steps(&[other.clone(), t.clone()], 2, 3), &x)?;
    }

    #[test]
    fn prop_row_bias_gradient(x in prop::collection::vec(-3.0f32..3.0, 3..4)) {
        let matrix = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], false);
        check(|bias| add_row_bias(&matrix, bias, 2, 3), &x)?;
    }

    #[test]
    fn prop_scale_rows_gradient_factors(x in prop::collection::vec(-3.0f32..3.0, 2..3)) {
        let matrix = Tensor::from_vec(vec![1.0, -2.0, 3.0, 0.5, 5.0, -6.0], false);
        check(|f| scale_rows(&matrix, f, 2, 3), &x)?;
    }

    #[test]
    fn prop_sum_segments_gradient(x in prop::collection::vec(-3.0f32..3.0, 8..9)) {
        check(|t| sum_segments(t, 2, 4), &x)?;
    }

    #[test]
    fn prop_embedding_lookup_gradient(x in prop::collection::vec(-3.0f32..3.0, 8..9)) {
        check(|w| embedding_lookup(w, &[1, 3, 1, 0], 4, 2), &x)?;
    }
}
