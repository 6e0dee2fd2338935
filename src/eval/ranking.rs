//! Normalized Discounted Cumulative Gain over likelihood scores.
//!
//! Scores are negative log-likelihoods, so the ranking is ascending: the most
//! likely sequence takes rank 1. Relevance is 1 for a true continuation and 0
//! for a distractor.

use crate::error::{Error, Result};

/// Discounted Cumulative Gain of relevances already in rank order.
///
/// DCG = Σ_{i=1}^{n} rel_i / log2(i + 1)
pub fn dcg(ranked_relevance: &[f64]) -> f64 {
    ranked_relevance
        .iter()
        .enumerate()
        .map(|(i, &rel)| rel / ((i + 2) as f64).log2()) // i is 0-indexed
        .sum()
}

/// NDCG of a joint ranking of true (relevance 1) and distractor (relevance 0)
/// items.
///
/// Items are sorted by `scores` ascending. Equal scores keep their input
/// order (stable sort), so with the query block placed before the distractor
/// block a tie favours the true continuation. The ideal DCG places
/// `rank_position` relevant items in the top `rank_position` ranks. Returns 0
/// when the ideal DCG is 0.
///
/// # Example
///
/// ```
/// use centinela::eval::ndcg;
///
/// let score = ndcg(&[1.0, 1.0, 0.0, 0.0], &[0.1, 0.2, 0.9, 1.0], 2).unwrap();
/// assert!((score - 1.0).abs() < 1e-12);
/// ```
pub fn ndcg(relevance: &[f64], scores: &[f32], rank_position: usize) -> Result<f64> {
    if relevance.len() != scores.len() {
        return Err(Error::shape(
            "ndcg relevance vs scores",
            vec![relevance.len()],
            vec![scores.len()],
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let ranked: Vec<f64> = order.iter().map(|&i| relevance[i]).collect();

    let ideal = vec![1.0; rank_position];
    let idcg = dcg(&ideal);
    if idcg == 0.0 {
        return Ok(0.0);
    }

    Ok(dcg(&ranked) / idcg)
}
