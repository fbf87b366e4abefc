// hubmock - a mock healthcare scheduling backend
//
// The signing core lives in `hubmock-webhooks`; settings loading lives in
// `hubmock-config`. This crate re-exports both behind features.

#[cfg(feature = "webhooks")]
pub use hubmock_webhooks;

#[cfg(feature = "config")]
pub use hubmock_config;

// Prelude for common imports
#[cfg(feature = "webhooks")]
pub mod prelude {
    pub use hubmock_webhooks::{
        Action, DeliveryOutcome, DeliveryStatus, EventType, HeaderSet, InboundRequest, KeyRing,
        RequestSigner, RetryPolicy, Secret, SignatureParameters, SignatureVerifier,
        SigningContext, WebhookConfig, WebhookDispatcher, WebhookError, WebhookEvent,
    };

    #[cfg(feature = "config")]
    pub use hubmock_config::Settings;
}
