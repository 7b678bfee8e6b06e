//! Configuration loading for the analyzer.
//!
//! All knobs are plain values consumed by the analysis pipeline; there is
//! no process-wide mutable configuration. The external scheduler/CLI owns
//! when and how often configuration is reloaded.

mod schema;

pub use schema::*;

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}
