//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, RunSpec, ValidateArgs};

/// Format the model block as a string
pub fn format_model_info(spec: &RunSpec) -> String {
    let model = &spec.model;
    let mut lines = vec![
        format!("  Vocabulary: {}", model.vocab_size),
        format!(
            "  Embedding / hidden: {} / {}",
            model.embedding_size, model.hidden_size
        ),
        format!("  Layers: {}", model.n_layers),
        format!("  Time steps: {}", model.time_steps),
        format!("  Sentinel cache: {}", model.use_sentinel),
        format!(
            "  Start / stop tokens: {} / {}",
            model.start_token, model.stop_token
        ),
    ];
    if let Some(cap) = model.eval_max_len {
        lines.push(format!("  Eval max length: {cap}"));
    }
    lines.join("\n")
}

/// Format the data block as a string
pub fn format_data_info(spec: &RunSpec) -> String {
    let mut lines = vec![format!("  Training episodes: {}", spec.data.train.display())];
    if let Some(held_out) = &spec.data.held_out {
        lines.push(format!("  Held-out episodes: {}", held_out.display()));
    }
    lines.join("\n")
}

/// Format optimisation settings as a string
pub fn format_training_info(spec: &RunSpec) -> String {
    [
        format!("  Optimizer: adam (lr={})", spec.model.learning_rate),
        format!("  Gradient clipping: {}", spec.model.max_grad_norm),
        format!("  Epochs: {}", spec.training.epochs),
        format!("  Log interval: {}", spec.training.log_interval),
    ]
    .join("\n")
}

/// Format decoding settings as a string
pub fn format_sampling_info(spec: &RunSpec) -> String {
    let decoder = match spec.sampling.temperature {
        Some(t) => format!("temperature {t} (seed {})", spec.sampling.seed),
        None => "greedy".to_string(),
    };
    format!(
        "  Sampling: {} tokens, {decoder}",
        spec.sampling.num_steps
    )
}

/// Print detailed configuration summary
pub fn print_detailed_summary(spec: &RunSpec) {
    println!();
    println!("Configuration Summary:");
    println!("{}", format_model_info(spec));
    println!();
    println!("{}", format_data_info(spec));
    println!();
    println!("{}", format_training_info(spec));
    println!();
    println!("{}", format_sampling_info(spec));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&spec);
    }

    Ok(())
}
