//! Length-masked stacked LSTM over a padded batch

use crate::autograd::{embedding_lookup, stack_steps, Context, Tensor};
use crate::error::{Error, Result};
use crate::trace::{TraceStep, TRACER};
use rand::rngs::StdRng;

use super::cell::{complement, LstmCell};
use super::embedding::Embedding;
use super::state::RecurrentState;

/// Hidden states of a forward pass.
#[derive(Debug, Clone)]
pub struct EncoderOutput {
    /// Top-layer outputs `[batch · time_steps · hidden]`, zero past each length
    pub hidden: Tensor,
    /// State at each sequence's last valid position
    pub final_state: RecurrentState,
}

/// Stacked LSTM. Layer 0 reads the embedding, deeper layers read the layer
/// below.
pub struct SequenceEncoder {
    cells: Vec<LstmCell>,
    hidden_size: usize,
}

impl SequenceEncoder {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        n_layers: usize,
        init_scale: f32,
        rng: &mut StdRng,
    ) -> Self {
        let cells = (0..n_layers)
            .map(|layer| {
                let input = if layer == 0 { input_size } else { hidden_size };
                LstmCell::new(input, hidden_size, init_scale, rng)
            })
            .collect();
        Self { cells, hidden_size }
    }

    pub fn zero_state(&self, batch: usize) -> RecurrentState {
        RecurrentState::zeros(batch, self.hidden_size, self.cells.len())
    }

    /// Run the batch `tokens` (`[batch · time_steps]`, `batch = lengths.len()`).
    ///
    /// Every length must be in `1..=time_steps`. Steps past the longest
    /// sequence are not computed and their outputs are zero.
    pub fn encode(
        &self,
        embedding: &Embedding,
        tokens: &[u32],
        lengths: &[usize],
        initial: &RecurrentState,
        ctx: &Context,
    ) -> Result<EncoderOutput> {
        let batch = lengths.len();
        if batch == 0 {
            return Err(Error::EmptySet("encoder batch"));
        }
        if tokens.len() % batch != 0 {
            return Err(Error::shape("encoder tokens", vec![batch, 0], vec![tokens.len()]));
        }
        let time_steps = tokens.len() / batch;
        for (index, &length) in lengths.iter().enumerate() {
            if length == 0 || length > time_steps {
                return Err(Error::InvalidLength { index, length, max: time_steps });
            }
        }
        embedding.check_ids(tokens)?;
        initial.check(batch, self.hidden_size, self.cells.len())?;

        Ok(TRACER.span(TraceStep::Encode, format!("B={batch} T={time_steps}"), || {
            self.run(embedding, tokens, lengths, time_steps, initial, ctx)
        }))
    }

    fn run(
        &self,
        embedding: &Embedding,
        tokens: &[u32],
        lengths: &[usize],
        time_steps: usize,
        initial: &RecurrentState,
        ctx: &Context,
    ) -> EncoderOutput {
        let batch = lengths.len();
        let hs = self.hidden_size;
        let longest = lengths.iter().copied().max().unwrap_or(0);
        let table = ctx.bind(&embedding.weight);

        let mut layers = initial.layers().to_vec();
        let mut outputs = Vec::with_capacity(time_steps);

        for t in 0..longest {
            let ids: Vec<u32> = (0..batch).map(|b| tokens[b * time_steps + t]).collect();
            let alive_rows: Vec<f32> = lengths
                .iter()
                .flat_map(|&len| std::iter::repeat_n(if t < len { 1.0 } else { 0.0 }, hs))
                .collect();
            let alive = Tensor::from_vec(alive_rows, false);
            let dead = complement(&alive);

            let mut x = embedding_lookup(&table, &ids, embedding.vocab_size(), embedding.dim());
            for (cell, layer) in self.cells.iter().zip(layers.iter_mut()) {
                let (out, next) = cell.step(&x, layer, &alive, &dead, batch, ctx);
                *layer = next;
                x = out;
            }
            outputs.push(x);
        }
        outputs.resize_with(time_steps, || Tensor::zeros(batch * hs, false));

        EncoderOutput {
            hidden: stack_steps(&outputs, batch, hs),
            final_state: RecurrentState::from_layers(layers, batch, hs),
        }
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.cells.iter_mut().flat_map(LstmCell::parameters_mut).collect()
    }
}
