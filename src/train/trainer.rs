//! Epoch loop over episodes

use std::time::Instant;
use tracing::info;

use crate::config::ValidationError;
use crate::data::Episode;
use crate::error::Result;
use crate::rnn::EpisodeModel;

/// Metrics recorded at the end of an epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    pub epoch: usize,
    /// Mean training loss over the epoch's episodes
    pub train_loss: f32,
    /// Mean query NLL over held-out episodes
    pub eval_nll: Option<f32>,
    /// Mean NDCG over held-out episodes that have distractors
    pub ndcg: Option<f64>,
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Final epoch reached
    pub final_epoch: usize,
    /// Final training loss
    pub final_loss: f32,
    /// Best epoch loss achieved
    pub best_loss: f32,
    pub history: Vec<EpochMetrics>,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}

/// Drives an [`EpisodeModel`] through epochs of episodes.
pub struct EpisodeTrainer<M: EpisodeModel> {
    model: M,
    log_interval: usize,
}

impl<M: EpisodeModel> EpisodeTrainer<M> {
    /// `log_interval` is the number of episodes between progress lines.
    pub fn new(model: M, log_interval: usize) -> Self {
        Self { model, log_interval: log_interval.max(1) }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// One pass over `episodes`. Returns the mean training loss.
    pub fn train_epoch(&mut self, epoch: usize, episodes: &[Episode]) -> Result<f32> {
        let mut total_loss = 0.0;
        for (i, episode) in episodes.iter().enumerate() {
            total_loss += self.model.train(episode)?;
            if (i + 1) % self.log_interval == 0 {
                info!(epoch, step = i + 1, loss = total_loss / (i + 1) as f32, "training");
            }
        }
        Ok(if episodes.is_empty() { 0.0 } else { total_loss / episodes.len() as f32 })
    }

    /// Mean query NLL and mean NDCG over `episodes`, without updating
    /// parameters.
    pub fn evaluate(&mut self, episodes: &[Episode]) -> Result<(Option<f32>, Option<f64>)> {
        if episodes.is_empty() {
            return Ok((None, None));
        }
        let mut nll = 0.0;
        let mut ndcg = Vec::new();
        for episode in episodes {
            nll += self.model.eval(episode)?;
            if episode.other_query.first().is_some_and(|g| !g.is_empty()) {
                ndcg.push(self.model.eval_ranking(episode)?);
            }
        }
        let mean_ndcg = (!ndcg.is_empty()).then(|| ndcg.iter().sum::<f64>() / ndcg.len() as f64);
        Ok((Some(nll / episodes.len() as f32), mean_ndcg))
    }

    /// Train for `epochs`, evaluating on `held_out` after each epoch.
    ///
    /// `epochs` must be positive.
    pub fn fit(
        &mut self,
        train: &[Episode],
        held_out: &[Episode],
        epochs: usize,
    ) -> Result<TrainResult> {
        if epochs == 0 {
            return Err(ValidationError::InvalidEpochs(epochs).into());
        }
        let start = Instant::now();
        let mut history = Vec::with_capacity(epochs);
        let mut best_loss = f32::INFINITY;

        for epoch in 0..epochs {
            let train_loss = self.train_epoch(epoch, train)?;
            let (eval_nll, ndcg) = self.evaluate(held_out)?;
            best_loss = best_loss.min(train_loss);
            info!(epoch, train_loss, ?eval_nll, ?ndcg, "epoch complete");
            history.push(EpochMetrics { epoch, train_loss, eval_nll, ndcg });
        }

        Ok(TrainResult {
            final_epoch: epochs,
            final_loss: history.last().map_or(0.0, |m| m.train_loss),
            best_loss,
            history,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}
