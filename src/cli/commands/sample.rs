//! Sample command implementation

use super::train::{fit, load_data};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, validate_config, SampleArgs};
use crate::rnn::{ArgmaxSampler, Sampler, TemperatureSampler};

pub fn run_sample(args: SampleArgs, level: LogLevel) -> Result<(), String> {
    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    if let Some(steps) = args.steps {
        spec.sampling.num_steps = steps;
    }
    if let Some(temperature) = args.temperature {
        spec.sampling.temperature = Some(temperature);
    }
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    let (train, held_out) = load_data(&spec)?;
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Fitting {} epochs on {} episodes before decoding",
            spec.training.epochs,
            train.len()
        ),
    );
    let (model, result) = fit(&spec, &train, &held_out)?;
    log(
        level,
        LogLevel::Verbose,
        &format!("  Final training loss {:.4}", result.final_loss),
    );

    let sampler: Box<dyn Sampler> = match spec.sampling.temperature {
        Some(t) => Box::new(TemperatureSampler::new(t, spec.sampling.seed)),
        None => Box::new(ArgmaxSampler),
    };
    let mut model = model.with_sampler(sampler);
    let tokens = model
        .sample_from_start(spec.sampling.num_steps)
        .map_err(|e| format!("Sampling error: {e}"))?;

    let rendered: Vec<String> = tokens.iter().map(u32::to_string).collect();
    log(level, LogLevel::Normal, &rendered.join(" "));
    Ok(())
}
