//! Weight-tied token embedding

use crate::autograd::{embedding_lookup, matmul_nt, Context, Tensor};
use crate::error::{Error, Result};
use rand::rngs::StdRng;

use super::uniform_param;

/// Embedding table shared by the input lookup and the output projection
pub struct Embedding {
    /// Embedding weight (vocab_size x dim)
    pub weight: Tensor,
    vocab_size: usize,
    dim: usize,
}

impl Embedding {
    pub fn new(vocab_size: usize, dim: usize, init_scale: f32, rng: &mut StdRng) -> Self {
        Self { weight: uniform_param(vocab_size * dim, init_scale, rng), vocab_size, dim }
    }

    /// Reject ids outside the vocabulary.
    pub fn check_ids(&self, token_ids: &[u32]) -> Result<()> {
        match token_ids.iter().find(|&&t| t as usize >= self.vocab_size) {
            Some(&token) => Err(Error::TokenOutOfRange { token, vocab_size: self.vocab_size }),
            None => Ok(()),
        }
    }

    /// Look up `[ids.len() · dim]` embedding rows
    pub fn forward(&self, token_ids: &[u32], ctx: &Context) -> Result<Tensor> {
        self.check_ids(token_ids)?;
        Ok(embedding_lookup(&ctx.bind(&self.weight), token_ids, self.vocab_size, self.dim))
    }

    /// Tied output projection: `[rows · dim] · weightᵗ -> [rows · vocab]`
    pub fn project(&self, hidden: &Tensor, rows: usize, ctx: &Context) -> Tensor {
        matmul_nt(hidden, &ctx.bind(&self.weight), rows, self.dim, self.vocab_size)
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{add, backward, sum};
    use rand::SeedableRng;

    fn table() -> Embedding {
        let mut embedding = Embedding::new(3, 2, 0.1, &mut StdRng::seed_from_u64(0));
        embedding.weight = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0, 2.0, 3.0], true);
        embedding
    }

    #[test]
    fn test_forward_rejects_out_of_vocab() {
        let embedding = table();
        let err = embedding.forward(&[0, 3], &Context::new()).unwrap_err();
        assert!(matches!(err, Error::TokenOutOfRange { token: 3, vocab_size: 3 }));
    }

    #[test]
    fn test_projection_is_hidden_times_embedding_transpose() {
        let embedding = table();
        let hidden = Tensor::from_vec(vec![1.0, 2.0], false);
        let logits = embedding.project(&hidden, 1, &Context::inference());
        assert_eq!(logits.data().to_vec(), vec![1.0, 2.0, 8.0]);
    }

    #[test]
    fn test_tied_weight_collects_both_gradients() {
        let embedding = table();
        let ctx = Context::new();
        let x = embedding.forward(&[2], &ctx).unwrap();
        let logits = embedding.project(&x, 1, &ctx);
        let mut loss = add(&sum(&logits), &sum(&x));
        backward(&mut loss, None);

        // d/dW of Σ(x · Wᵗ) with x = W[2]: row r gets x, row 2 additionally Σ_r W[r];
        // plus 1 on row 2 from Σx.
        let grad = embedding.weight.grad().unwrap().to_vec();
        assert_eq!(grad, vec![2.0, 3.0, 2.0, 3.0, 2.0 + 3.0 + 1.0, 3.0 + 4.0 + 1.0]);
    }

    #[test]
    fn test_inference_binding_leaves_weight_untouched() {
        let embedding = table();
        let x = embedding.forward(&[1], &Context::inference()).unwrap();
        assert!(!x.requires_grad());
    }
}
