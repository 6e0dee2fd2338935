//! Per-episode training, evaluation and sampling

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::autograd::{backward, Context, Tensor};
use crate::data::{
    convert_tokens_to_input_and_target, Episode, SequenceGroup, TokenBatch, PAD_TOKEN,
};
use crate::error::{Error, Result};
use crate::eval::ndcg;
use crate::optim::{clip_grad_norm_refs, Adam, Optimizer};
use crate::train::loss::{SequenceLoss, SequenceNll};
use crate::trace::{TraceStep, TRACER};

use super::config::ModelConfig;
use super::embedding::Embedding;
use super::encoder::SequenceEncoder;
use super::output::{Distribution, OutputDistribution};
use super::sampler::{ArgmaxSampler, Sampler};
use super::sentinel::PointerSentinel;
use super::state::RecurrentState;

/// Operations a training driver needs from an episodic language model.
pub trait EpisodeModel {
    /// One optimisation step on support ∪ query. Returns the batch-mean NLL.
    fn train(&mut self, episode: &Episode) -> Result<f32>;

    /// Batch-mean NLL of the query set; the support set is ignored.
    fn eval(&mut self, episode: &Episode) -> Result<f32>;

    /// NDCG of query sequences ranked against the distractor set.
    fn eval_ranking(&mut self, episode: &Episode) -> Result<f64>;

    /// Decode `num_steps` tokens from the start token, threading `state`.
    fn sample(&mut self, state: &mut RecurrentState, num_steps: usize) -> Result<Vec<u32>>;
}

/// Everything one forward computation produces.
#[derive(Debug)]
pub struct ForwardPass {
    pub distribution: Distribution,
    pub nll: SequenceNll,
    pub final_state: RecurrentState,
}

/// LSTM language model with weight-tied output and optional sentinel cache.
///
/// Parameters live for the lifetime of the model; every call recomputes its
/// activations from scratch.
pub struct LstmLanguageModel {
    config: ModelConfig,
    embedding: Embedding,
    encoder: SequenceEncoder,
    output: OutputDistribution,
    optimizer: Adam,
    sampler: Box<dyn Sampler>,
    train_calls: u64,
    eval_calls: u64,
}

impl LstmLanguageModel {
    /// Validate `config` and initialise parameters from its seed.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let scale = config.init_scale;
        let embedding = Embedding::new(config.vocab_size, config.embedding_size, scale, &mut rng);
        let encoder = SequenceEncoder::new(
            config.embedding_size,
            config.hidden_size,
            config.n_layers,
            scale,
            &mut rng,
        );
        let output = if config.use_sentinel {
            let scorer = PointerSentinel::new(config.hidden_size, scale, &mut rng);
            OutputDistribution::with_cache(config.vocab_size, Box::new(scorer))
        } else {
            OutputDistribution::plain(config.vocab_size)
        };

        let model = Self {
            optimizer: Adam::default_params(config.learning_rate),
            sampler: Box::new(ArgmaxSampler),
            embedding,
            encoder,
            output,
            train_calls: 0,
            eval_calls: 0,
            config,
        };
        info!(
            vocab = model.config.vocab_size,
            hidden = model.config.hidden_size,
            layers = model.config.n_layers,
            sentinel = model.output.uses_cache(),
            "built language model"
        );
        Ok(model)
    }

    /// Replace the decoding sampler (argmax by default).
    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub fn embedding_mut(&mut self) -> &mut Embedding {
        &mut self.embedding
    }

    pub fn train_calls(&self) -> u64 {
        self.train_calls
    }

    pub fn eval_calls(&self) -> u64 {
        self.eval_calls
    }

    pub fn zero_state(&self, batch: usize) -> RecurrentState {
        self.encoder.zero_state(batch)
    }

    /// Total number of trainable scalars.
    pub fn num_parameters(&mut self) -> usize {
        collect_parameters(&mut self.embedding, &mut self.encoder, &mut self.output)
            .iter()
            .map(|p| p.len())
            .sum()
    }

    /// Frame `groups` with the configured start/stop tokens.
    pub fn adapt(&self, groups: &[SequenceGroup]) -> Result<TokenBatch> {
        convert_tokens_to_input_and_target(
            groups,
            self.config.start_token,
            self.config.stop_token,
            self.config.time_steps,
        )
    }

    /// Encoder, output head and loss over a framed batch.
    ///
    /// In evaluation mode the scored lengths are capped at `eval_max_len`.
    pub fn forward(
        &self,
        batch: &TokenBatch,
        initial: Option<&RecurrentState>,
        ctx: &Context,
    ) -> Result<ForwardPass> {
        let time_steps = self.config.time_steps;
        if batch.time_steps != time_steps {
            return Err(Error::shape("batch window", vec![time_steps], vec![batch.time_steps]));
        }
        let n = batch.batch_size();
        if n == 0 {
            return Err(Error::EmptySet("batch"));
        }

        let zero;
        let initial = match initial {
            Some(state) => state,
            None => {
                zero = self.encoder.zero_state(n);
                &zero
            }
        };

        let encoded =
            self.encoder.encode(&self.embedding, &batch.inputs, &batch.lengths, initial, ctx)?;
        let distribution = self.output.forward(
            &encoded.hidden,
            &self.embedding,
            &batch.targets,
            n,
            time_steps,
            ctx,
        );

        let scored_lengths: Vec<usize> = match (ctx.is_training(), self.config.eval_max_len) {
            (false, Some(cap)) => batch.lengths.iter().map(|&len| len.min(cap)).collect(),
            _ => batch.lengths.clone(),
        };
        let loss = SequenceLoss::new(self.config.vocab_size, time_steps);
        let nll = TRACER.span(TraceStep::Loss, format!("B={n}"), || {
            loss.forward(&distribution.logits, &batch.targets, &scored_lengths)
        })?;

        Ok(ForwardPass { distribution, nll, final_state: encoded.final_state })
    }

    /// Per-sequence NLL of `groups` in evaluation mode.
    pub fn score_sequences(&self, groups: &[SequenceGroup]) -> Result<Vec<f32>> {
        let batch = self.adapt(groups)?;
        let pass = self.forward(&batch, None, &Context::inference())?;
        Ok(pass.nll.per_sequence_values())
    }

    /// Next-token distribution after feeding `token` on top of `state`.
    pub fn step(&self, token: u32, state: &RecurrentState) -> Result<(Vec<f32>, RecurrentState)> {
        let ctx = Context::inference();
        let encoded = self.encoder.encode(&self.embedding, &[token], &[1], state, &ctx)?;
        let distribution =
            self.output.forward(&encoded.hidden, &self.embedding, &[PAD_TOKEN], 1, 1, &ctx);
        Ok((distribution.probs.values().to_vec(), encoded.final_state))
    }

    /// Decode from a fresh zero state.
    pub fn sample_from_start(&mut self, num_steps: usize) -> Result<Vec<u32>> {
        let mut state = self.zero_state(1);
        self.sample(&mut state, num_steps)
    }
}

impl EpisodeModel for LstmLanguageModel {
    fn train(&mut self, episode: &Episode) -> Result<f32> {
        let support = self.adapt(&episode.support)?;
        let query = self.adapt(&episode.query)?;
        let batch = TokenBatch::concat(&[support, query])?;
        if batch.batch_size() == 0 {
            return Err(Error::EmptySet("support or query"));
        }

        let pass = self.forward(&batch, None, &Context::new())?;
        let loss = pass.nll.mean_value();
        let mut objective = pass.nll.mean.clone();
        TRACER.span(TraceStep::Backward, format!("B={}", batch.batch_size()), || {
            backward(&mut objective, None);
        });

        let max_grad_norm = self.config.max_grad_norm;
        let grad_norm = {
            let Self { embedding, encoder, output, optimizer, .. } = &mut *self;
            let mut params = collect_parameters(embedding, encoder, output);
            TRACER.span(TraceStep::Optimizer, "adam", || {
                let norm = clip_grad_norm_refs(&mut params, max_grad_norm);
                optimizer.step_refs(&mut params);
                optimizer.zero_grad_refs(&mut params);
                norm
            })
        };

        debug!(tag = "Train/loss", step = self.train_calls, loss, grad_norm, "train step");
        self.train_calls += 1;
        Ok(loss)
    }

    fn eval(&mut self, episode: &Episode) -> Result<f32> {
        let batch = self.adapt(&episode.query)?;
        if batch.batch_size() == 0 {
            return Err(Error::EmptySet("query"));
        }
        let pass = self.forward(&batch, None, &Context::inference())?;
        let avg_nll = pass.nll.mean_value();

        debug!(tag = "Eval/Avg_NLL", step = self.eval_calls, avg_nll, "eval");
        self.eval_calls += 1;
        Ok(avg_nll)
    }

    fn eval_ranking(&mut self, episode: &Episode) -> Result<f64> {
        let episode = episode.first_group();
        if episode.query_count() == 0 {
            return Err(Error::EmptySet("query"));
        }
        if episode.other_query.iter().all(SequenceGroup::is_empty) {
            return Err(Error::EmptySet("other query"));
        }

        let nll = self.score_sequences(&episode.query)?;
        let nll_other = self.score_sequences(&episode.other_query)?;

        let relevance: Vec<f64> = std::iter::repeat_n(1.0, nll.len())
            .chain(std::iter::repeat_n(0.0, nll_other.len()))
            .collect();
        let scores: Vec<f32> = nll.iter().chain(&nll_other).copied().collect();
        let score = ndcg(&relevance, &scores, nll.len())?;
        debug!(query = nll.len(), other = nll_other.len(), ndcg = score, "ranking");
        Ok(score)
    }

    fn sample(&mut self, state: &mut RecurrentState, num_steps: usize) -> Result<Vec<u32>> {
        let mut token = self.config.start_token;
        let mut tokens = Vec::with_capacity(num_steps);
        for _ in 0..num_steps {
            let (probs, next) = self.step(token, state)?;
            token = self.sampler.sample(&probs);
            tokens.push(token);
            *state = next;
        }
        Ok(tokens)
    }
}

/// Trainable tensors in a fixed order (optimizer slots are positional).
fn collect_parameters<'a>(
    embedding: &'a mut Embedding,
    encoder: &'a mut SequenceEncoder,
    output: &'a mut OutputDistribution,
) -> Vec<&'a mut Tensor> {
    let mut params = vec![&mut embedding.weight];
    params.extend(encoder.parameters_mut());
    params.extend(output.parameters_mut());
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn episode() -> Episode {
        let group = |rows: Vec<Vec<u32>>| SequenceGroup::from_sequences(rows);
        Episode {
            support: vec![group(vec![vec![3, 4, 5], vec![3, 4, 6]])],
            query: vec![group(vec![vec![3, 4, 5, 6]])],
            other_query: vec![group(vec![vec![7, 7, 7, 7]])],
        }
    }

    fn model(use_sentinel: bool) -> LstmLanguageModel {
        let config = ModelConfig {
            use_sentinel,
            learning_rate: 0.05,
            init_scale: 0.2,
            ..ModelConfig::tiny(8, 6, 6)
        };
        LstmLanguageModel::new(config).unwrap()
    }

    #[test]
    fn test_construction_rejects_untied_dimensions() {
        let config = ModelConfig { embedding_size: 4, ..ModelConfig::tiny(8, 6, 6) };
        assert!(matches!(LstmLanguageModel::new(config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_parameter_count() {
        // embedding 8·6, one LSTM layer (6·24 + 6·24 + 24), sentinel 6·6 + 6 + 6
        assert_eq!(model(false).num_parameters(), 48 + 312);
        assert_eq!(model(true).num_parameters(), 48 + 312 + 48);
    }

    #[test]
    fn test_training_lowers_loss() {
        for use_sentinel in [false, true] {
            let mut m = model(use_sentinel);
            let ep = episode();
            let first = m.train(&ep).unwrap();
            let mut last = first;
            for _ in 0..30 {
                last = m.train(&ep).unwrap();
            }
            assert!(last < first, "sentinel={use_sentinel}: {last} !< {first}");
            assert_eq!(m.train_calls(), 31);
        }
    }

    #[test]
    fn test_eval_does_not_change_parameters() {
        let mut m = model(true);
        let ep = episode();
        let a = m.eval(&ep).unwrap();
        let b = m.eval(&ep).unwrap();
        assert_eq!(a, b);
        assert_eq!(m.eval_calls(), 2);
        assert!(m.embedding().weight.grad().is_none());
    }

    #[test]
    fn test_eval_ignores_support() {
        let mut m = model(false);
        let mut ep = episode();
        let a = m.eval(&ep).unwrap();
        ep.support = vec![SequenceGroup::from_sequences(vec![vec![1, 1]])];
        assert_abs_diff_eq!(a, m.eval(&ep).unwrap());
    }

    #[test]
    fn test_eval_max_len_caps_scored_positions() {
        let config = ModelConfig { eval_max_len: Some(1), ..ModelConfig::tiny(8, 6, 6) };
        let mut capped = LstmLanguageModel::new(config).unwrap();
        let mut full = LstmLanguageModel::new(ModelConfig::tiny(8, 6, 6)).unwrap();
        let ep = episode();
        assert!(capped.eval(&ep).unwrap() < full.eval(&ep).unwrap());
    }

    #[test]
    fn test_ranking_in_unit_interval_and_requires_distractors() {
        let mut m = model(true);
        let mut ep = episode();
        let score = m.eval_ranking(&ep).unwrap();
        assert!((0.0..=1.0).contains(&score));

        ep.other_query.clear();
        assert!(matches!(m.eval_ranking(&ep), Err(Error::EmptySet(_))));
    }

    #[test]
    fn test_argmax_sampling_is_reproducible() {
        let mut m = model(true);
        let a = m.sample_from_start(5).unwrap();
        let b = m.sample_from_start(5).unwrap();
        assert_eq!(a.len(), 5);
        assert_eq!(a, b);
        assert!(a.iter().all(|&t| t < 8));
    }

    #[test]
    fn test_sampling_threads_caller_state() {
        let mut m = model(false);
        let mut state = m.zero_state(1);
        m.sample(&mut state, 3).unwrap();
        assert!(state.top_hidden().unwrap().data().iter().any(|&v| v != 0.0));

        let mut wrong = m.zero_state(2);
        assert!(m.sample(&mut wrong, 1).is_err());
    }

    #[test]
    fn test_overlong_query_is_rejected() {
        let mut m = model(false);
        let mut ep = episode();
        ep.query = vec![SequenceGroup::from_sequences(vec![vec![3; 6]])];
        assert!(matches!(m.eval(&ep), Err(Error::InvalidLength { .. })));
    }

    /// Shift one scalar of the `param`-th trainable tensor by `delta`.
    fn nudge(m: &mut LstmLanguageModel, param: usize, index: usize, delta: f32) {
        let LstmLanguageModel { embedding, encoder, output, .. } = m;
        collect_parameters(embedding, encoder, output)[param].data_mut()[index] += delta;
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let eps = 1e-2;
        for use_sentinel in [false, true] {
            let config = ModelConfig {
                use_sentinel,
                n_layers: 2,
                init_scale: 0.3,
                ..ModelConfig::tiny(8, 4, 6)
            };
            let mut m = LstmLanguageModel::new(config).unwrap();
            let ep = episode();
            let batch =
                TokenBatch::concat(&[m.adapt(&ep.support).unwrap(), m.adapt(&ep.query).unwrap()])
                    .unwrap();

            let pass = m.forward(&batch, None, &Context::new()).unwrap();
            backward(&mut pass.nll.mean.clone(), None);
            let analytic: Vec<Vec<f32>> = {
                let LstmLanguageModel { embedding, encoder, output, .. } = &mut m;
                let params = collect_parameters(embedding, encoder, output);
                params
                    .iter()
                    .map(|p| p.grad().map_or_else(|| vec![0.0; p.len()], |g| g.to_vec()))
                    .collect()
            };
            // embedding, 2 x (w_x, w_h, bias), then w_q, b_q, sentinel
            assert_eq!(analytic.len(), if use_sentinel { 10 } else { 7 });

            let loss_at = |m: &LstmLanguageModel| {
                m.forward(&batch, None, &Context::inference()).unwrap().nll.mean_value()
            };
            for (param, grad) in analytic.iter().enumerate() {
                for index in (0..grad.len()).step_by(grad.len() / 6 + 1) {
                    nudge(&mut m, param, index, eps);
                    let up = loss_at(&m);
                    nudge(&mut m, param, index, -2.0 * eps);
                    let down = loss_at(&m);
                    nudge(&mut m, param, index, eps);

                    let numeric = (up - down) / (2.0 * eps);
                    let tolerance = 2e-3 + 0.05 * numeric.abs();
                    assert!(
                        (numeric - grad[index]).abs() < tolerance,
                        "sentinel={use_sentinel} param {param}[{index}]: \
                         analytic {} vs numeric {numeric}",
                        grad[index]
                    );
                }
            }
        }
    }
}
