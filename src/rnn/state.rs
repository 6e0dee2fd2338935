//! Recurrent state carried between calls

use crate::autograd::Tensor;
use crate::error::{Error, Result};

/// Cell and hidden vectors of one layer, each `[batch · hidden]`.
#[derive(Debug, Clone)]
pub struct LayerState {
    pub c: Tensor,
    pub h: Tensor,
}

/// Per-layer `(c, h)` for a batch.
///
/// Owned by the caller between sampling steps; the model never keeps one.
#[derive(Debug, Clone)]
pub struct RecurrentState {
    layers: Vec<LayerState>,
    batch: usize,
    hidden: usize,
}

impl RecurrentState {
    pub fn zeros(batch: usize, hidden: usize, n_layers: usize) -> Self {
        let layers = (0..n_layers)
            .map(|_| LayerState {
                c: Tensor::zeros(batch * hidden, false),
                h: Tensor::zeros(batch * hidden, false),
            })
            .collect();
        Self { layers, batch, hidden }
    }

    pub(crate) fn from_layers(layers: Vec<LayerState>, batch: usize, hidden: usize) -> Self {
        Self { layers, batch, hidden }
    }

    pub fn layers(&self) -> &[LayerState] {
        &self.layers
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    /// Top-layer hidden vector.
    pub fn top_hidden(&self) -> Option<&Tensor> {
        self.layers.last().map(|l| &l.h)
    }

    /// Same values, cut from any recorded graph.
    pub fn detach(&self) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|l| LayerState { c: l.c.detach(), h: l.h.detach() })
            .collect();
        Self { layers, batch: self.batch, hidden: self.hidden }
    }

    pub(crate) fn check(&self, batch: usize, hidden: usize, n_layers: usize) -> Result<()> {
        if self.batch != batch || self.hidden != hidden || self.layers.len() != n_layers {
            return Err(Error::shape(
                "initial recurrent state",
                vec![n_layers, batch, hidden],
                vec![self.layers.len(), self.batch, self.hidden],
            ));
        }
        Ok(())
    }
}
