//! Configuration for the webhook dispatcher

use crate::canonical::SigningStringEncoding;
use crate::{EventType, Result, RetryPolicy, Secret, WebhookError};
use std::time::Duration;
use url::Url;

/// Headers signed on every outbound webhook, in signing order
pub const DEFAULT_SIGNED_HEADERS: [&str; 2] = ["Content-Type", "Host"];

/// Configuration for the webhook dispatcher
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Hub base URL, e.g. `http://localhost:3000`
    pub base_url: Url,

    /// Optional partner segment inserted after `/webhooks`
    pub partner: Option<String>,

    /// Value of the envelope `group_id` field
    pub group_id: String,

    /// Key id advertised in the signature
    pub key_id: String,

    /// Shared secret for `key_id`
    pub secret: Secret,

    /// Header names covered by the signature, in order
    pub signed_headers: Vec<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Retry policy, no retries by default
    pub retry_policy: RetryPolicy,

    /// How the signing string is fed to the HMAC
    pub signing_encoding: SigningStringEncoding,

    /// Add `uuid` and `last_modified_date` to every envelope
    pub legacy_envelope: bool,
}

impl WebhookConfig {
    /// Create a builder
    pub fn builder() -> WebhookConfigBuilder {
        WebhookConfigBuilder::new()
    }

    /// Target URL for an event type: `<base>/webhooks/[<partner>/]<segment>`
    pub fn target_url(&self, event_type: EventType) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                WebhookError::Config(format!("base URL cannot be a base: {}", self.base_url))
            })?;
            segments.pop_if_empty().push("webhooks");
            if let Some(partner) = &self.partner {
                segments.push(partner);
            }
            segments.push(event_type.path_segment());
        }
        Ok(url)
    }
}

/// Builder for WebhookConfig
#[derive(Debug, Clone)]
pub struct WebhookConfigBuilder {
    base_url: Option<String>,
    partner: Option<String>,
    group_id: String,
    key_id: Option<String>,
    secret: Option<Secret>,
    signed_headers: Vec<String>,
    timeout: Duration,
    user_agent: String,
    retry_policy: RetryPolicy,
    signing_encoding: SigningStringEncoding,
    legacy_envelope: bool,
}

impl Default for WebhookConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            base_url: None,
            partner: None,
            group_id: "212".to_string(),
            key_id: None,
            secret: None,
            signed_headers: DEFAULT_SIGNED_HEADERS.iter().map(|h| h.to_string()).collect(),
            timeout: Duration::from_secs(30),
            user_agent: format!("hubmock-webhooks/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: RetryPolicy::none(),
            signing_encoding: SigningStringEncoding::Raw,
            legacy_envelope: false,
        }
    }

    /// Set the hub base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the partner path segment; an empty string clears it
    pub fn partner(mut self, partner: impl Into<String>) -> Self {
        let partner = partner.into();
        self.partner = (!partner.is_empty()).then_some(partner);
        self
    }

    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Set the signing key
    pub fn signing_key(mut self, key_id: impl Into<String>, secret: impl Into<Secret>) -> Self {
        self.key_id = Some(key_id.into());
        self.secret = Some(secret.into());
        self
    }

    /// Replace the list of signed header names
    pub fn signed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn signing_encoding(mut self, encoding: SigningStringEncoding) -> Self {
        self.signing_encoding = encoding;
        self
    }

    pub fn legacy_envelope(mut self, enabled: bool) -> Self {
        self.legacy_envelope = enabled;
        self
    }

    /// Build the configuration
    ///
    /// Fails when the base URL or the signing key is missing, or the secret
    /// is empty.
    pub fn build(self) -> Result<WebhookConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| WebhookError::Config("base URL is required".to_string()))?;
        let base_url = Url::parse(&base_url)?;

        let (key_id, secret) = match (self.key_id, self.secret) {
            (Some(key_id), Some(secret)) => (key_id, secret),
            _ => return Err(WebhookError::Config("signing key is required".to_string())),
        };
        if key_id.is_empty() {
            return Err(WebhookError::Config("key id cannot be empty".to_string()));
        }
        if secret.is_empty() {
            return Err(WebhookError::Config("secret cannot be empty".to_string()));
        }

        Ok(WebhookConfig {
            base_url,
            partner: self.partner,
            group_id: self.group_id,
            key_id,
            secret,
            signed_headers: self.signed_headers,
            timeout: self.timeout,
            user_agent: self.user_agent,
            retry_policy: self.retry_policy,
            signing_encoding: self.signing_encoding,
            legacy_envelope: self.legacy_envelope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> WebhookConfigBuilder {
        WebhookConfig::builder()
            .base_url("http://localhost:3000")
            .signing_key("hubmock", "secret")
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.group_id, "212");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.signed_headers, vec!["Content-Type", "Host"]);
        assert_eq!(config.retry_policy.max_retries, 0);
        assert!(!config.legacy_envelope);
    }

    #[test]
    fn test_missing_secret_fails() {
        let err = WebhookConfig::builder()
            .base_url("http://localhost:3000")
            .build()
            .unwrap_err();
        assert!(matches!(err, WebhookError::Config(_)));

        let err = WebhookConfig::builder()
            .base_url("http://localhost:3000")
            .signing_key("hubmock", "")
            .build()
            .unwrap_err();
        assert!(matches!(err, WebhookError::Config(msg) if msg.contains("secret")));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = WebhookConfig::builder()
            .base_url("not a url")
            .signing_key("k", "s")
            .build()
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidUrl(_)));
    }

    #[test]
    fn test_target_url_with_partner() {
        let config = builder().partner("medesync").build().unwrap();
        assert_eq!(
            config.target_url(EventType::Appointment).unwrap().as_str(),
            "http://localhost:3000/webhooks/medesync/appointments"
        );
    }

    #[test]
    fn test_target_url_without_partner() {
        let config = builder()
            .base_url("https://hub.example.com/api/")
            .partner("")
            .build()
            .unwrap();
        assert_eq!(
            config.target_url(EventType::Availability).unwrap().as_str(),
            "https://hub.example.com/api/webhooks/availabilities"
        );
    }
}
