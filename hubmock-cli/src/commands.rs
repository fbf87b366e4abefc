//! Command implementations.

use crate::error::{CliError, CliResult};
use hubmock_config::Settings;
use hubmock_webhooks::{
    Action, EventType, HeaderSet, InboundRequest, KeyRing, RequestSigner, SignatureVerifier,
    SigningContext, WEBHOOK_METHOD, WebhookConfig, WebhookDispatcher, WebhookEvent,
};
use tracing::{debug, info};

/// Where a request to sign or verify was sent.
pub struct RequestTarget {
    pub host: String,
    pub path: String,
    pub query: String,
    pub body: String,
}

/// Map validated settings onto the dispatcher configuration.
pub fn webhook_config(settings: &Settings, legacy: bool) -> CliResult<WebhookConfig> {
    let mut builder = WebhookConfig::builder()
        .base_url(&settings.webhooks_base_url)
        .group_id(&settings.webhooks_group_id)
        .signing_key(&settings.webhooks_key_id, settings.webhooks_secret.as_str())
        .timeout_secs(settings.webhooks_timeout_secs)
        .legacy_envelope(legacy || settings.webhooks_legacy_envelope);

    if let Some(partner) = &settings.webhooks_partner {
        builder = builder.partner(partner);
    }

    Ok(builder.build()?)
}

/// Dispatch one webhook and print the outcome as JSON.
pub async fn send(
    settings: &Settings,
    event_type: EventType,
    action: Action,
    data: Option<&str>,
    legacy: bool,
) -> CliResult<()> {
    let payload = match data {
        Some(raw) => serde_json::from_str(raw)?,
        None => serde_json::Value::Null,
    };

    let dispatcher = WebhookDispatcher::new(webhook_config(settings, legacy)?)?;
    info!(%event_type, %action, "Triggering webhook");

    let outcome = dispatcher
        .spawn(WebhookEvent::new(event_type, action).with_payload(payload))
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.is_success() {
        Ok(())
    } else {
        Err(CliError::NotDelivered(outcome.status))
    }
}

/// Print the `Authorization` value for a request.
pub fn sign(settings: &Settings, target: &RequestTarget) -> CliResult<()> {
    let signer = RequestSigner::new(&settings.webhooks_key_id, settings.webhooks_secret.as_str());
    let ctx = SigningContext::post(&target.host, &target.path).with_query(&target.query);
    let headers = HeaderSet::new()
        .with("Content-Type", "application/json")
        .with("Host", &target.host);

    let params = signer.sign_request(&ctx, &headers, target.body.as_bytes());
    println!("{}", params);
    Ok(())
}

/// Verify an `Authorization` value against a request.
pub fn verify(
    settings: &Settings,
    authorization: &str,
    target: &RequestTarget,
    tolerance: Option<u64>,
) -> CliResult<()> {
    let request = InboundRequest::new(WEBHOOK_METHOD, &target.host, &target.path)
        .with_query(&target.query)
        .with_header("Content-Type", "application/json")
        .with_body(target.body.as_bytes());

    let keys = KeyRing::single(&settings.webhooks_key_id, settings.webhooks_secret.as_str());
    let mut verifier = SignatureVerifier::new();
    if let Some(seconds) = tolerance {
        verifier = verifier.with_tolerance(seconds);
    }

    match verifier.verify(authorization, &request, &keys) {
        Ok(params) => {
            println!("signature valid (keyId={} nonce={})", params.key_id, params.nonce);
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "Signature verification failed");
            Err(CliError::SignatureRejected)
        }
    }
}

/// Print the effective settings, secret omitted.
pub fn show_config(settings: &Settings) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry("webhooks_secret".to_string())
            .or_insert_with(|| "cli-secret".to_string());
        Settings::from_map(&map).unwrap()
    }

    #[test]
    fn test_webhook_config_from_settings() {
        let config = webhook_config(&settings(&[("webhooks_group_id", "99")]), false).unwrap();
        assert_eq!(config.group_id, "99");
        assert_eq!(config.partner.as_deref(), Some("medesync"));
        assert_eq!(
            config.target_url(EventType::Patient).unwrap().as_str(),
            "http://localhost:3000/webhooks/medesync/patients"
        );
    }

    #[test]
    fn test_legacy_flag_overrides_settings() {
        let config = webhook_config(&settings(&[]), true).unwrap();
        assert!(config.legacy_envelope);
    }

    #[test]
    fn test_no_partner_segment() {
        let config = webhook_config(&settings(&[("webhooks_partner", "")]), false).unwrap();
        assert!(config.partner.is_none());
    }

    #[test]
    fn test_verify_rejects_foreign_key() {
        let target = RequestTarget {
            host: "localhost:3000".to_string(),
            path: "/webhooks/medesync/patients".to_string(),
            query: String::new(),
            body: "{}".to_string(),
        };
        let foreign = RequestSigner::new("someone-else", "cli-secret");
        let ctx = SigningContext::post(&target.host, &target.path);
        let headers = HeaderSet::new()
            .with("Content-Type", "application/json")
            .with("Host", &target.host);
        let auth = foreign.sign_request(&ctx, &headers, b"{}").to_header_value();

        let err = verify(&settings(&[]), &auth, &target, None).unwrap_err();
        assert!(matches!(err, CliError::SignatureRejected));
    }
}
