//! YAML run-spec loading

use std::fs;
use std::path::Path;

use super::schema::RunSpec;
use super::validate::validate_config;
use crate::error::{Error, Result};

/// Load a run specification from a YAML file and validate it.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<RunSpec> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading config file {}", path.display()), e))?;

    let spec = parse_config(&yaml_content).map_err(|e| match e {
        Error::ConfigParsing { message, .. } => Error::ConfigParsing {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;

    validate_config(&spec)?;
    Ok(spec)
}

/// Parse a run specification from YAML text without validating it.
pub fn parse_config(yaml: &str) -> Result<RunSpec> {
    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParsing {
        path: "<inline>".into(),
        message: e.to_string(),
    })
}
