//! Dispatcher for signed outgoing webhooks

use crate::canonical::{SigningContext, WEBHOOK_METHOD, host_header_value};
use crate::digest::{HeaderSet, encode_body};
use crate::legacy::{LEGACY_SIGNATURE_HEADER, envelope_legacy_signature};
use crate::{
    DeliveryOutcome, Result, RetryPolicy, SignatureParameters, WebhookConfig, WebhookEnvelope,
    WebhookEvent,
};
use crate::signature::RequestSigner;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// A fully signed request, ready to send
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub url: Url,

    /// Headers sent with the request, `Authorization` excluded
    pub headers: Vec<(String, String)>,

    /// Body bytes; these are exactly the bytes that were hashed
    pub body: Vec<u8>,

    pub signature: SignatureParameters,
}

impl SignedRequest {
    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        self.signature.to_header_value()
    }
}

/// Sends signed webhooks to the hub
///
/// Cloning is cheap; clones share configuration and the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    config: Arc<WebhookConfig>,
    signer: RequestSigner,
    http_client: Client,
}

impl WebhookDispatcher {
    /// Create a dispatcher
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let signer = RequestSigner::new(&config.key_id, config.secret.clone())
            .with_encoding(config.signing_encoding);

        Ok(Self {
            config: Arc::new(config),
            signer,
            http_client,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Wrap an event payload in the hub envelope
    pub fn envelope(&self, event: &WebhookEvent) -> WebhookEnvelope {
        let envelope =
            WebhookEnvelope::new(event.action, &self.config.group_id, event.payload.clone());
        if self.config.legacy_envelope {
            envelope.with_legacy_fields(Uuid::new_v4(), Utc::now())
        } else {
            envelope
        }
    }

    /// Build and sign the request for an event without sending it
    ///
    /// A legacy envelope also gets a `medesync-signature` header.
    pub fn prepare(&self, event: &WebhookEvent) -> Result<SignedRequest> {
        let url = self.config.target_url(event.event_type)?;
        let envelope = self.envelope(event);
        let body = encode_body(&envelope)?;

        let mut headers = base_headers(&url);
        if let Some(value) = envelope_legacy_signature(&envelope, &self.config.secret) {
            headers.push((LEGACY_SIGNATURE_HEADER.to_string(), value));
        }
        self.sign_with_headers(url, headers, body)
    }

    /// Sign `body` for a POST to `url` with a fresh nonce and timestamp
    pub fn sign(&self, url: Url, body: Vec<u8>) -> Result<SignedRequest> {
        let headers = base_headers(&url);
        self.sign_with_headers(url, headers, body)
    }

    fn sign_with_headers(
        &self,
        url: Url,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<SignedRequest> {
        let signed = HeaderSet::select(&self.config.signed_headers, &headers)?;

        let ctx = SigningContext::from_url(WEBHOOK_METHOD, &url);
        let signature = self.signer.sign_request(&ctx, &signed, &body);

        Ok(SignedRequest {
            url,
            headers,
            body,
            signature,
        })
    }

    /// Send one event and wait for the outcome
    ///
    /// Never fails: every problem is logged and recorded in the outcome.
    pub async fn dispatch(&self, event: WebhookEvent) -> DeliveryOutcome {
        let event_type = event.event_type;
        let action = event.action;

        let mut request = match self.prepare(&event) {
            Ok(request) => request,
            Err(e) => {
                error!(%event_type, %action, error = %e, "Failed to build webhook");
                let mut outcome = DeliveryOutcome::new(event_type, action, "");
                outcome.abort(e.to_string());
                return outcome;
            }
        };

        let mut outcome = DeliveryOutcome::new(event_type, action, request.url.as_str());
        let policy: &RetryPolicy = &self.config.retry_policy;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(%event_type, %action, url = %request.url, attempt, "Sending webhook");

            let retryable = match self.send(&request).await {
                Ok((status, body)) => {
                    outcome.record_response(status, body);
                    if outcome.is_success() {
                        info!(%event_type, %action, url = %request.url, status, attempt, "Webhook delivered");
                        return outcome;
                    }

                    warn!(%event_type, %action, url = %request.url, status, attempt, "Webhook rejected by hub");
                    RetryPolicy::is_retryable_status(status)
                }
                Err(e) => {
                    error!(%event_type, %action, url = %request.url, attempt, error = %e, "Webhook delivery failed");
                    outcome.record_transport_error(e.to_string());
                    true
                }
            };

            if !retryable || !policy.should_retry(attempt) {
                return outcome;
            }

            tokio::time::sleep(policy.delay_for_retry(attempt)).await;

            // Nonces are single use, so every retry gets a new signature
            request = match self.sign_with_headers(request.url, request.headers, request.body) {
                Ok(request) => request,
                Err(e) => {
                    outcome.abort(e.to_string());
                    return outcome;
                }
            };
        }
    }

    /// Dispatch in the background
    ///
    /// The caller may drop the handle; the outcome is logged either way.
    pub fn spawn(&self, event: WebhookEvent) -> JoinHandle<DeliveryOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.dispatch(event).await })
    }

    async fn send(&self, request: &SignedRequest) -> Result<(u16, Option<String>)> {
        let mut builder = self.http_client.post(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .header(AUTHORIZATION, request.authorization())
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        Ok((status, body))
    }
}

fn base_headers(url: &Url) -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Host".to_string(), host_header_value(url)),
    ]
}
