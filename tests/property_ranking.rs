//! Property tests for the ranking metric, the masked loss and the
//! start/stop-token adapter.
//!
//! - NDCG is bounded to [0, 1] and is 1 when every true item scores best
//! - Per-sequence NLL ignores everything beyond each sequence's length
//! - Adapter framing keeps `L + 1` effective tokens

use centinela::autograd::Tensor;
use centinela::data::{convert_tokens_to_input_and_target, SequenceGroup, PAD_TOKEN};
use centinela::eval::ndcg;
use centinela::train::SequenceLoss;
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// Strategy Helpers
// =============================================================================

/// Scores for `n_true` true items and `n_other` distractors
fn ranking_case() -> impl Strategy<Value = (usize, Vec<f32>)> {
    (1usize..6, 1usize..6).prop_flat_map(|(n_true, n_other)| {
        (Just(n_true), vec(0.0f32..50.0, n_true + n_other))
    })
}

fn relevance(n_true: usize, total: usize) -> Vec<f64> {
    (0..total).map(|i| if i < n_true { 1.0 } else { 0.0 }).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_ndcg_bounded((n_true, scores) in ranking_case()) {
        let score = ndcg(&relevance(n_true, scores.len()), &scores, n_true).unwrap();
        prop_assert!((0.0..=1.0 + 1e-12).contains(&score), "NDCG {} out of range", score);
        prop_assert!(score.is_finite());
    }

    #[test]
    fn prop_ndcg_perfect_when_true_items_best((n_true, scores) in ranking_case()) {
        // True items get strictly lower NLL than every distractor
        let shifted: Vec<f32> = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| if i < n_true { s } else { s + 100.0 })
            .collect();
        let score = ndcg(&relevance(n_true, shifted.len()), &shifted, n_true).unwrap();
        prop_assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_ndcg_ties_favour_query_block(n_true in 1usize..5, n_other in 1usize..5) {
        let scores = vec![1.0f32; n_true + n_other];
        let score = ndcg(&relevance(n_true, scores.len()), &scores, n_true).unwrap();
        prop_assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_loss_ignores_padding(
        lengths in vec(1usize..=5, 1..4),
        seed_logits in vec(-3.0f32..3.0, 4 * 5 * 6),
        junk in vec(0u32..6, 4 * 5),
    ) {
        let (vocab, time_steps) = (6, 5);
        let batch = lengths.len();
        let logits = Tensor::from_vec(seed_logits[..batch * time_steps * vocab].to_vec(), false);
        let targets: Vec<u32> = (0..batch * time_steps).map(|i| (i % vocab) as u32).collect();

        // Same valid prefix, different padding targets
        let mut padded = targets.clone();
        for b in 0..batch {
            for t in lengths[b]..time_steps {
                padded[b * time_steps + t] = junk[b * time_steps + t];
            }
        }

        let loss = SequenceLoss::new(vocab, time_steps);
        let clean = loss.forward(&logits, &targets, &lengths).unwrap();
        let noisy = loss.forward(&logits, &padded, &lengths).unwrap();
        prop_assert_eq!(clean.per_sequence_values(), noisy.per_sequence_values());
        prop_assert!(clean.per_sequence_values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn prop_adapter_frames_every_sequence(
        rows in vec(vec(3u32..20, 0..6), 1..5),
    ) {
        let time_steps = 7;
        let group = SequenceGroup::from_sequences(rows.clone());
        let batch = convert_tokens_to_input_and_target(&[group], 1, 2, time_steps).unwrap();

        prop_assert_eq!(batch.batch_size(), rows.len());
        for (b, row) in rows.iter().enumerate() {
            let length = row.len();
            prop_assert_eq!(batch.lengths[b], length + 1);
            prop_assert_eq!(batch.input_row(b)[0], 1);
            prop_assert_eq!(&batch.input_row(b)[1..=length], &row[..]);
            prop_assert_eq!(&batch.target_row(b)[..length], &row[..]);
            prop_assert_eq!(batch.target_row(b)[length], 2);
            prop_assert!(batch.target_row(b)[length + 1..].iter().all(|&t| t == PAD_TOKEN));
        }
    }
}

#[test]
fn test_reversed_ranking_example() {
    let score = ndcg(&[0.0, 0.0, 1.0, 1.0], &[0.1, 0.2, 0.9, 1.0], 2).unwrap();
    assert!((score - 0.570).abs() < 1e-3);
}
