//! Signed webhooks for the hubmock scheduling backend
//!
//! Every change to an availability, appointment, resource, patient or
//! service is pushed to the hub as a signed `POST`. This crate builds those
//! requests and verifies the same signatures on the receiving side.
//!
//! # Signing protocol
//!
//! 1. The header block (`content-type:...\nhost:...\n`) and the body bytes are
//!    each hashed with SHA-256 and base64 encoded.
//! 2. Method, host, path, query, both digests, key id, timestamp and nonce are
//!    joined into the signing string (see [`build_signing_string`]).
//! 3. The signing string is signed with HMAC-SHA256 and the result is sent as
//!
//! ```text
//! Authorization: Signature keyId=<id> algorithm=hmac-sha256 headers=content-type,host nonce=<n> timestamps=<unix> signature=<base64>
//! ```
//!
//! # Example: Sending Webhooks
//!
//! ```rust,no_run
//! use hubmock_webhooks::{Action, EventType, WebhookConfig, WebhookDispatcher, WebhookEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WebhookConfig::builder()
//!         .base_url("http://localhost:3000")
//!         .partner("medesync")
//!         .signing_key("hubmock", "shared-secret")
//!         .build()?;
//!     let dispatcher = WebhookDispatcher::new(config)?;
//!
//!     let event = WebhookEvent::new(EventType::Appointment, Action::Create)
//!         .with_payload(serde_json::json!({"id": "a1", "patient_id": "p1"}));
//!
//!     let outcome = dispatcher.dispatch(event).await;
//!     println!("{:?}", outcome.status);
//!     Ok(())
//! }
//! ```
//!
//! # Example: Verifying Webhooks
//!
//! ```rust,no_run
//! use hubmock_webhooks::{InboundRequest, KeyRing, SignatureVerifier};
//!
//! let keys = KeyRing::single("hubmock", "shared-secret");
//! let request = InboundRequest::new("POST", "localhost:3000", "/webhooks/medesync/appointments")
//!     .with_header("Content-Type", "application/json")
//!     .with_body(br#"{"request_action":"create","group_id":"212","data":{}}"#.to_vec());
//!
//! let authorization = "Signature keyId=hubmock algorithm=hmac-sha256 ...";
//! let valid = SignatureVerifier::new().is_valid(authorization, &request, &keys);
//! ```

mod canonical;
mod config;
mod delivery;
mod digest;
mod dispatcher;
mod error;
mod event;
mod legacy;
mod retry;
mod signature;
mod verifier;

pub use canonical::{
    SigningContext, SigningStringEncoding, WEBHOOK_METHOD, build_signing_string, host_header_value,
};
pub use config::{DEFAULT_SIGNED_HEADERS, WebhookConfig, WebhookConfigBuilder};
pub use delivery::{DeliveryOutcome, DeliveryStatus};
pub use digest::{HeaderSet, encode_body, hash_body, hash_headers, sha256_base64};
pub use dispatcher::{SignedRequest, WebhookDispatcher};
pub use error::WebhookError;
pub use event::{Action, EventType, WebhookEnvelope, WebhookEvent};
pub use legacy::{
    LEGACY_SIGNATURE_HEADER, envelope_legacy_signature, legacy_signature, verify_legacy_signature,
};
pub use retry::RetryPolicy;
pub use signature::{
    Algorithm, RequestSigner, SCHEME, Secret, SignatureParameters, new_nonce, sign,
    sign_with_encoding,
};
pub use verifier::{InboundRequest, KeyRing, SecretLookup, SignatureVerifier};

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
