//! Error types for the hubmock CLI.

use hubmock_config::ConfigError;
use hubmock_webhooks::{DeliveryStatus, WebhookError};
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Dispatch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Webhook not delivered: {0:?}")]
    NotDelivered(DeliveryStatus),

    /// Deliberately vague; the cause is only logged at debug level
    #[error("signature rejected")]
    SignatureRejected,
}
