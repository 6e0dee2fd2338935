//! Info command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, InfoArgs};
use crate::rnn::LstmLanguageModel;

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&spec)
            .map_err(|e| format!("JSON serialization error: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let mut model =
        LstmLanguageModel::new(spec.model.clone()).map_err(|e| format!("Model error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration Info:");
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Model: LSTM {}x{} over {} tokens ({} parameters)",
            spec.model.n_layers,
            spec.model.hidden_size,
            spec.model.vocab_size,
            model.num_parameters()
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Output head: {}",
            if spec.model.use_sentinel {
                "vocabulary softmax + pointer-sentinel cache"
            } else {
                "vocabulary softmax"
            }
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("Time steps: {}", spec.model.time_steps),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("Epochs: {}", spec.training.epochs),
    );
    Ok(())
}
