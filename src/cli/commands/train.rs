//! Train command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, validate_config, RunSpec, TrainArgs};
use crate::data::{load_episodes, Episode};
use crate::rnn::LstmLanguageModel;
use crate::trace::TRACER;
use crate::train::{EpisodeTrainer, TrainResult};

/// Load the episode files named by `spec`.
pub(super) fn load_data(spec: &RunSpec) -> Result<(Vec<Episode>, Vec<Episode>), String> {
    let train = load_episodes(&spec.data.train).map_err(|e| format!("Data error: {e}"))?;
    let held_out = match &spec.data.held_out {
        Some(path) => load_episodes(path).map_err(|e| format!("Data error: {e}"))?,
        None => Vec::new(),
    };
    Ok((train, held_out))
}

/// Build a model from `spec` and fit it for `spec.training.epochs`.
pub(super) fn fit(
    spec: &RunSpec,
    train: &[Episode],
    held_out: &[Episode],
) -> Result<(LstmLanguageModel, TrainResult), String> {
    let model =
        LstmLanguageModel::new(spec.model.clone()).map_err(|e| format!("Model error: {e}"))?;
    let mut trainer = EpisodeTrainer::new(model, spec.training.log_interval);
    let result = trainer
        .fit(train, held_out, spec.training.epochs)
        .map_err(|e| format!("Training error: {e}"))?;
    Ok((trainer.into_model(), result))
}

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Centinela: Training from {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    if args.dry_run {
        log(
            level,
            LogLevel::Normal,
            "Dry run - config validated successfully",
        );
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Model: V={} H={} layers={} T={} sentinel={}",
                spec.model.vocab_size,
                spec.model.hidden_size,
                spec.model.n_layers,
                spec.model.time_steps,
                spec.model.use_sentinel
            ),
        );
        log(
            level,
            LogLevel::Verbose,
            &format!("  Epochs: {}", spec.training.epochs),
        );
        return Ok(());
    }

    let (train, held_out) = load_data(&spec)?;
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Loaded {} training and {} held-out episodes",
            train.len(),
            held_out.len()
        ),
    );

    if args.trace {
        TRACER.clear();
        TRACER.enable();
    }
    let fitted = fit(&spec, &train, &held_out);
    if args.trace {
        TRACER.disable();
    }
    let (_, result) = fitted?;

    for metrics in &result.history {
        let mut line = format!(
            "  Epoch {:>3}: train loss {:.4}",
            metrics.epoch, metrics.train_loss
        );
        if let Some(nll) = metrics.eval_nll {
            line.push_str(&format!(", held-out NLL {nll:.4}"));
        }
        if let Some(ndcg) = metrics.ndcg {
            line.push_str(&format!(", NDCG {ndcg:.4}"));
        }
        log(level, LogLevel::Normal, &line);
    }

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Training complete: best loss {:.4} in {:.2}s",
            result.best_loss, result.elapsed_secs
        ),
    );

    if args.trace {
        log(level, LogLevel::Normal, &TRACER.report());
    }
    Ok(())
}
