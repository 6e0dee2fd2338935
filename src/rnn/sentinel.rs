//! Pointer-sentinel cache over tokens already emitted in the sequence

use crate::autograd::{
    add_row_bias, concat, concat_cols, masked_softmax_rows, matmul, matmul_nt, slice, slice_cols,
    tanh, Context, Tensor,
};
use rand::rngs::StdRng;

use super::uniform_param;

/// Candidate weights and gate for every `(batch, step)`.
#[derive(Debug, Clone)]
pub struct CacheScores {
    /// `[batch · T · T]`: weight of candidate position i for step t, zero for i >= t
    pub weights: Tensor,
    /// `[batch · T]`: mass left for the vocabulary softmax
    pub gate: Tensor,
}

/// Scoring strategy behind the cache distribution.
///
/// For each step t the candidates are positions `i < t`, carrying token
/// `targets[i]`. The weights of a step are non-negative and sum to
/// `1 - gate`.
pub trait CacheScorer {
    fn score(
        &self,
        hidden: &Tensor,
        targets: &[u32],
        batch: usize,
        time_steps: usize,
        ctx: &Context,
    ) -> CacheScores;

    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;
}

/// Attention from a query projection of the current state onto earlier
/// states, with a learned sentinel vector competing in the same softmax.
///
/// `q_t = tanh(h_t·W_q + b_q)`, candidate score `q_t·h_i`, sentinel score
/// `q_t·s`. The gate is the sentinel's share, so at t = 0 it is 1.
pub struct PointerSentinel {
    /// Query projection (hidden x hidden)
    pub w_q: Tensor,
    pub b_q: Tensor,
    /// Sentinel vector (hidden)
    pub sentinel: Tensor,
    hidden_size: usize,
}

impl PointerSentinel {
    pub fn new(hidden_size: usize, init_scale: f32, rng: &mut StdRng) -> Self {
        Self {
            w_q: uniform_param(hidden_size * hidden_size, init_scale, rng),
            b_q: Tensor::zeros(hidden_size, true),
            sentinel: uniform_param(hidden_size, init_scale, rng),
            hidden_size,
        }
    }
}

/// Row t allows columns `i < t` plus the trailing sentinel column.
fn causal_mask(time_steps: usize) -> Vec<bool> {
    let width = time_steps + 1;
    (0..time_steps * width)
        .map(|k| {
            let (t, i) = (k / width, k % width);
            i < t || i == time_steps
        })
        .collect()
}

impl CacheScorer for PointerSentinel {
    fn score(
        &self,
        hidden: &Tensor,
        _targets: &[u32],
        batch: usize,
        time_steps: usize,
        ctx: &Context,
    ) -> CacheScores {
        let (t_steps, hs) = (time_steps, self.hidden_size);
        let w_q = ctx.bind(&self.w_q);
        let b_q = ctx.bind(&self.b_q);
        let sentinel = ctx.bind(&self.sentinel);
        let mask = causal_mask(t_steps);

        let mut weights = Vec::with_capacity(batch);
        let mut gates = Vec::with_capacity(batch);
        for b in 0..batch {
            let states = slice(hidden, b * t_steps * hs, t_steps * hs);
            let projected = matmul(&states, &w_q, t_steps, hs, hs);
            let queries = tanh(&add_row_bias(&projected, &b_q, t_steps, hs));

            let candidate_scores = matmul_nt(&queries, &states, t_steps, hs, t_steps);
            let sentinel_scores = matmul(&queries, &sentinel, t_steps, hs, 1);
            let joint = concat_cols(&candidate_scores, &sentinel_scores, t_steps, t_steps, 1);
            let probs = masked_softmax_rows(&joint, &mask, t_steps, t_steps + 1);

            weights.push(slice_cols(&probs, t_steps, t_steps + 1, 0, t_steps));
            gates.push(slice_cols(&probs, t_steps, t_steps + 1, t_steps, 1));
        }

        CacheScores { weights: concat(&weights), gate: concat(&gates) }
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.w_q, &mut self.b_q, &mut self.sentinel]
    }
}

/// Sum candidate weights onto the vocabulary ids they carry.
///
/// `weights` is `[batch · T · T]`, `targets` `[batch · T]`; returns
/// `[batch · T · vocab]`. The result keeps the `(1 - gate)` scale of the
/// weights.
pub fn scatter_to_vocab(
    weights: &Tensor,
    targets: &[u32],
    batch: usize,
    time_steps: usize,
    vocab: usize,
) -> Tensor {
    let t_steps = time_steps;
    let per_batch: Vec<Tensor> = (0..batch)
        .map(|b| {
            let mut one_hot = vec![0.0f32; t_steps * vocab];
            for (i, &token) in targets[b * t_steps..(b + 1) * t_steps].iter().enumerate() {
                one_hot[i * vocab + token as usize] = 1.0;
            }
            let w_b = slice(weights, b * t_steps * t_steps, t_steps * t_steps);
            matmul(&w_b, &Tensor::from_vec(one_hot, false), t_steps, t_steps, vocab)
        })
        .collect();
    concat(&per_batch)
}
