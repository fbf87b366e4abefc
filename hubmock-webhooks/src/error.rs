//! Error types for webhook signing, verification and dispatch

use thiserror::Error;

/// Errors that can occur while signing, verifying or sending webhooks
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The authorization header is missing a field or is not a `Signature` value
    #[error("Malformed authorization header: {0}")]
    MalformedAuthorizationHeader(String),

    /// No secret is registered for the key id named in the header
    #[error("Unknown key id: {0}")]
    UnknownKeyId(String),

    /// The recomputed signature does not match the supplied one
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The signature names an algorithm this crate cannot verify
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature timestamp falls outside the configured freshness window
    #[error("Signature timestamp outside window: {age} seconds (tolerance: {tolerance} seconds)")]
    TimestampOutsideWindow { age: u64, tolerance: u64 },

    /// Payload could not be serialized to its wire form
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Outbound HTTP request failed
    #[error("Dispatch transport error: {0}")]
    DispatchTransportError(#[from] reqwest::Error),

    /// A header named for signing is not present on the request
    #[error("Missing signed header: {0}")]
    MissingSignedHeader(String),

    /// Invalid webhook URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::SerializationError(err.to_string())
    }
}
