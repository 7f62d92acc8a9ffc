use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::GenerateConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub fn load_config(path: &Path) -> Result<GenerateConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<GenerateConfig, ConfigError> {
    let config: GenerateConfig = toml::from_str(text)?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads `path` when given, otherwise returns the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<GenerateConfig, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(GenerateConfig::default()),
    }
}

pub fn validate_config(config: &GenerateConfig) -> Result<(), ConfigError> {
    if config.batch.chunk_size == 0 {
        return Err(ConfigError::Invalid(
            "batch.chunk_size must be at least 1".to_string(),
        ));
    }
    if let Some(col) = config.normalization.degenerate_column() {
        return Err(ConfigError::Invalid(format!(
            "normalization column {col} needs a finite mean and a finite non-zero std"
        )));
    }
    if config.scorer.input_name.is_empty() || config.scorer.output_name.is_empty() {
        return Err(ConfigError::Invalid(
            "scorer input_name and output_name must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn render_config(config: &GenerateConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
#[path = "../../tests/src_inline/config/loader.rs"]
mod tests;
