//! `medesync-signature`, the header older hub versions check
//!
//! The value is HMAC-SHA1 over `uuid` followed by `last_modified_date`
//! (UTC, second precision), hex encoded, then base64 encoded as text. It
//! covers neither the body nor the target, so it only accompanies the
//! `Signature` authorization header and never replaces it.

use crate::signature::Secret;
use crate::{Result, WebhookEnvelope, WebhookError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the legacy signature
pub const LEGACY_SIGNATURE_HEADER: &str = "medesync-signature";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn mac(secret: &Secret, uuid: &Uuid, last_modified: &DateTime<Utc>) -> HmacSha1 {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(uuid.to_string().as_bytes());
    mac.update(last_modified.format(DATE_FORMAT).to_string().as_bytes());
    mac
}

/// Compute the `medesync-signature` value
pub fn legacy_signature(secret: &Secret, uuid: &Uuid, last_modified: &DateTime<Utc>) -> String {
    let digest = hex::encode(mac(secret, uuid, last_modified).finalize().into_bytes());
    STANDARD.encode(digest)
}

/// Legacy signature for an envelope carrying both legacy fields
pub fn envelope_legacy_signature(envelope: &WebhookEnvelope, secret: &Secret) -> Option<String> {
    match (&envelope.uuid, &envelope.last_modified_date) {
        (Some(uuid), Some(last_modified)) => Some(legacy_signature(secret, uuid, last_modified)),
        _ => None,
    }
}

/// Check a `medesync-signature` value in constant time
pub fn verify_legacy_signature(
    value: &str,
    secret: &Secret,
    uuid: &Uuid,
    last_modified: &DateTime<Utc>,
) -> Result<()> {
    let digest = STANDARD
        .decode(value.trim())
        .ok()
        .and_then(|hex_text| hex::decode(hex_text).ok())
        .ok_or(WebhookError::SignatureMismatch)?;

    mac(secret, uuid, last_modified)
        .verify_slice(&digest)
        .map_err(|_| WebhookError::SignatureMismatch)
}
