// Error types for configuration loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration missing: {0}")]
    Missing(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse {key}: {message}")]
    ParseError { key: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
