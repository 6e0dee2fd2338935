//! Vocabulary distribution with an optional sentinel cache mixture

use crate::autograd::{add, log_floor, scale_rows, softmax_rows, Context, Tensor};
use crate::trace::{TraceStep, TRACER};

use super::embedding::Embedding;
use super::sentinel::{scatter_to_vocab, CacheScorer};

/// Floor applied before taking the log of a mixed probability.
pub const LOG_EPSILON: f32 = 1e-10;

/// `g · p_vocab + p_cache` for `rows × vocab` distributions and a
/// per-row gate. `p_cache` must already carry the `(1 - g)` scale.
pub fn mix(p_vocab: &Tensor, p_cache: &Tensor, gate: &Tensor, rows: usize, vocab: usize) -> Tensor {
    add(&scale_rows(p_vocab, gate, rows, vocab), p_cache)
}

/// `ln(max(p, LOG_EPSILON))`
pub fn stable_log(p: &Tensor) -> Tensor {
    log_floor(p, LOG_EPSILON)
}

/// Result of the output head for a `[batch, T]` window.
#[derive(Debug, Clone)]
pub struct Distribution {
    /// `[batch · T · vocab]`. Raw projection in plain mode, `stable_log` of
    /// the mixture in sentinel mode.
    pub logits: Tensor,
    /// `[batch · T · vocab]`, each row sums to 1
    pub probs: Tensor,
    /// `[batch · T]` sentinel gate, only in sentinel mode
    pub gate: Option<Tensor>,
}

/// Tied projection to vocabulary logits, optionally mixed with a cache.
pub struct OutputDistribution {
    vocab_size: usize,
    scorer: Option<Box<dyn CacheScorer>>,
}

impl OutputDistribution {
    pub fn plain(vocab_size: usize) -> Self {
        Self { vocab_size, scorer: None }
    }

    pub fn with_cache(vocab_size: usize, scorer: Box<dyn CacheScorer>) -> Self {
        Self { vocab_size, scorer: Some(scorer) }
    }

    pub fn uses_cache(&self) -> bool {
        self.scorer.is_some()
    }

    /// `hidden` is `[batch · T · H]`; `targets` `[batch · T]` supplies the
    /// tokens the cache can point to.
    pub fn forward(
        &self,
        hidden: &Tensor,
        embedding: &Embedding,
        targets: &[u32],
        batch: usize,
        time_steps: usize,
        ctx: &Context,
    ) -> Distribution {
        let rows = batch * time_steps;
        let vocab = self.vocab_size;

        let (logits, p_vocab) = TRACER.span(TraceStep::Output, format!("{rows}x{vocab}"), || {
            let logits = embedding.project(hidden, rows, ctx);
            let probs = softmax_rows(&logits, rows, vocab);
            (logits, probs)
        });

        let Some(scorer) = &self.scorer else {
            return Distribution { logits, probs: p_vocab, gate: None };
        };

        TRACER.span(TraceStep::Sentinel, format!("B={batch} T={time_steps}"), || {
            let scores = scorer.score(hidden, targets, batch, time_steps, ctx);
            let p_cache = scatter_to_vocab(&scores.weights, targets, batch, time_steps, vocab);
            let probs = mix(&p_vocab, &p_cache, &scores.gate, rows, vocab);
            Distribution { logits: stable_log(&probs), probs, gate: Some(scores.gate) }
        })
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        match self.scorer.as_mut() {
            Some(scorer) => scorer.parameters_mut(),
            None => Vec::new(),
        }
    }
}
