//! Signature generation and the `Signature` authorization scheme

use crate::canonical::{SigningContext, SigningStringEncoding, build_signing_string};
use crate::digest::{HeaderSet, hash_body, hash_headers};
use crate::{Result, WebhookError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme name
pub const SCHEME: &str = "Signature";

/// A shared signing secret
///
/// `Debug` never prints the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap raw key material
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC can take any size key")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Supported signature algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// HMAC-SHA256, the only algorithm partners accept today
    #[default]
    HmacSha256,
}

impl Algorithm {
    /// Tag used in the `algorithm=` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha256 => "hmac-sha256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hmac-sha256" => Ok(Self::HmacSha256),
            other => Err(WebhookError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Compute the base64 HMAC-SHA256 of a signing string
pub fn sign(signing_string: &str, secret: &Secret) -> String {
    sign_with_encoding(signing_string, secret, SigningStringEncoding::Raw)
}

/// Compute the signature over the given encoding of the signing string
pub fn sign_with_encoding(
    signing_string: &str,
    secret: &Secret,
    encoding: SigningStringEncoding,
) -> String {
    let mut mac = secret.mac();
    mac.update(encoding.apply(signing_string).as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Check a base64 signature against a signing string in constant time
pub(crate) fn verify_signature(
    signing_string: &str,
    secret: &Secret,
    encoding: SigningStringEncoding,
    signature: &str,
) -> Result<()> {
    let supplied = STANDARD
        .decode(signature)
        .map_err(|_| WebhookError::SignatureMismatch)?;

    let mut mac = secret.mac();
    mac.update(encoding.apply(signing_string).as_bytes());
    mac.verify_slice(&supplied)
        .map_err(|_| WebhookError::SignatureMismatch)
}

/// Generate a fresh nonce
pub fn new_nonce() -> String {
    Uuid::new_v4().to_string()
}

/// The fields carried by a `Signature` authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameters {
    pub key_id: String,
    pub algorithm: String,
    pub headers: Vec<String>,
    pub nonce: String,
    pub timestamp: i64,
    pub signature: String,
}

impl SignatureParameters {
    /// Render the header value
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }

    /// Parse a header value
    ///
    /// Tokens are space separated `key=value` pairs after the leading
    /// `Signature` scheme token. Values may themselves contain `=` (base64
    /// padding); only the first `=` splits. Unknown keys are ignored, empty or
    /// duplicated required keys are rejected.
    pub fn parse(value: &str) -> Result<Self> {
        let mut tokens = value.split_whitespace();

        match tokens.next() {
            Some(SCHEME) => {}
            Some(other) => {
                return Err(WebhookError::MalformedAuthorizationHeader(format!(
                    "expected {} scheme, got {}",
                    SCHEME, other
                )));
            }
            None => {
                return Err(WebhookError::MalformedAuthorizationHeader(
                    "empty header".to_string(),
                ));
            }
        }

        let mut key_id = None;
        let mut algorithm = None;
        let mut headers = None;
        let mut nonce = None;
        let mut timestamp = None;
        let mut signature = None;

        for token in tokens {
            let (key, val) = token.split_once('=').ok_or_else(|| {
                WebhookError::MalformedAuthorizationHeader(format!("invalid token: {}", token))
            })?;

            let slot = match key {
                "keyId" => &mut key_id,
                "algorithm" => &mut algorithm,
                "headers" => &mut headers,
                "nonce" => &mut nonce,
                "timestamps" => &mut timestamp,
                "signature" => &mut signature,
                _ => continue,
            };

            if slot.is_some() {
                return Err(WebhookError::MalformedAuthorizationHeader(format!(
                    "duplicate field: {}",
                    key
                )));
            }
            if !val.is_empty() {
                *slot = Some(val);
            }
        }

        let timestamp = required(timestamp, "timestamps")?;
        // Canonical decimal only: the signing string is rebuilt from the value
        let timestamp = timestamp
            .parse::<i64>()
            .ok()
            .filter(|parsed| parsed.to_string() == timestamp)
            .ok_or_else(|| {
                WebhookError::MalformedAuthorizationHeader(format!(
                    "invalid timestamp: {}",
                    timestamp
                ))
            })?;

        Ok(Self {
            key_id: required(key_id, "keyId")?.to_string(),
            algorithm: required(algorithm, "algorithm")?.to_string(),
            headers: required(headers, "headers")?
                .split(',')
                .filter(|h| !h.is_empty())
                .map(str::to_ascii_lowercase)
                .collect(),
            nonce: required(nonce, "nonce")?.to_string(),
            timestamp,
            signature: required(signature, "signature")?.to_string(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value.ok_or_else(|| {
        WebhookError::MalformedAuthorizationHeader(format!("missing field: {}", field))
    })
}

impl fmt::Display for SignatureParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} keyId={} algorithm={} headers={} nonce={} timestamps={} signature={}",
            SCHEME,
            self.key_id,
            self.algorithm,
            self.headers.join(","),
            self.nonce,
            self.timestamp,
            self.signature
        )
    }
}

impl FromStr for SignatureParameters {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Signs outgoing requests with one key
#[derive(Debug, Clone)]
pub struct RequestSigner {
    key_id: String,
    secret: Secret,
    algorithm: Algorithm,
    encoding: SigningStringEncoding,
}

impl RequestSigner {
    /// Create a signer for the given key id and secret
    pub fn new(key_id: impl Into<String>, secret: impl Into<Secret>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            algorithm: Algorithm::HmacSha256,
            encoding: SigningStringEncoding::Raw,
        }
    }

    /// Set how the signing string is fed to the HMAC
    pub fn with_encoding(mut self, encoding: SigningStringEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign a request with the current time and a fresh nonce
    pub fn sign_request(
        &self,
        ctx: &SigningContext,
        headers: &HeaderSet,
        body: &[u8],
    ) -> SignatureParameters {
        self.sign_request_with(ctx, headers, body, chrono::Utc::now().timestamp(), &new_nonce())
    }

    /// Sign a request with an explicit timestamp and nonce
    pub fn sign_request_with(
        &self,
        ctx: &SigningContext,
        headers: &HeaderSet,
        body: &[u8],
        timestamp: i64,
        nonce: &str,
    ) -> SignatureParameters {
        let signing_string = build_signing_string(
            ctx,
            &hash_headers(headers),
            &hash_body(body),
            &self.key_id,
            timestamp,
            nonce,
        );

        SignatureParameters {
            key_id: self.key_id.clone(),
            algorithm: self.algorithm.to_string(),
            headers: headers.names(),
            nonce: nonce.to_string(),
            timestamp,
            signature: sign_with_encoding(&signing_string, &self.secret, self.encoding),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_params() -> SignatureParameters {
        SignatureParameters {
            key_id: "k1".to_string(),
            algorithm: "hmac-sha256".to_string(),
            headers: vec!["content-type".to_string(), "host".to_string()],
            nonce: "n1".to_string(),
            timestamp: 1700000000,
            signature: "abc123==".to_string(),
        }
    }

    #[test]
    fn test_header_field_order() {
        assert_eq!(
            fixed_params().to_header_value(),
            "Signature keyId=k1 algorithm=hmac-sha256 headers=content-type,host nonce=n1 timestamps=1700000000 signature=abc123=="
        );
    }

    #[test]
    fn test_parse_formatted_header() {
        let params = fixed_params();
        let parsed = SignatureParameters::parse(&params.to_header_value()).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_parse_ignores_field_order_and_unknown_fields() {
        let parsed: SignatureParameters = "Signature signature=abc= nonce=n timestamps=5 extra=1 headers=Host algorithm=hmac-sha256 keyId=k"
            .parse()
            .unwrap();
        assert_eq!(parsed.signature, "abc=");
        assert_eq!(parsed.headers, vec!["host"]);
        assert_eq!(parsed.timestamp, 5);
    }

    #[test]
    fn test_parse_missing_signature() {
        let err = SignatureParameters::parse(
            "Signature keyId=k1 algorithm=hmac-sha256 headers=host nonce=n1 timestamps=1",
        )
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedAuthorizationHeader(msg) if msg.contains("signature")));
    }

    #[test]
    fn test_parse_empty_signature_is_missing() {
        let err = SignatureParameters::parse(
            "Signature keyId=k1 algorithm=hmac-sha256 headers=host nonce=n1 timestamps=1 signature=",
        )
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedAuthorizationHeader(_)));
    }

    #[test]
    fn test_parse_rejects_wrong_scheme() {
        let err = SignatureParameters::parse("Bearer token").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedAuthorizationHeader(_)));

        let err = SignatureParameters::parse("").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedAuthorizationHeader(_)));
    }

    #[test]
    fn test_parse_rejects_bad_timestamp_and_duplicates() {
        let err = SignatureParameters::parse(
            "Signature keyId=k algorithm=hmac-sha256 headers=host nonce=n timestamps=soon signature=s",
        )
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedAuthorizationHeader(_)));

        let err = SignatureParameters::parse(
            "Signature keyId=k keyId=j algorithm=hmac-sha256 headers=host nonce=n timestamps=1 signature=s",
        )
        .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedAuthorizationHeader(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_parse_rejects_non_canonical_timestamps() {
        for spelling in ["+1700000000", "001700000000", "-0", "1e9"] {
            let header = format!(
                "Signature keyId=k algorithm=hmac-sha256 headers=host nonce=n timestamps={} signature=s",
                spelling
            );
            let err = SignatureParameters::parse(&header).unwrap_err();
            assert!(
                matches!(err, WebhookError::MalformedAuthorizationHeader(ref msg) if msg.contains("timestamp")),
                "{} was accepted",
                spelling
            );
        }

        for canonical in ["0", "-5", "1700000000"] {
            let header = format!(
                "Signature keyId=k algorithm=hmac-sha256 headers=host nonce=n timestamps={} signature=s",
                canonical
            );
            let params = SignatureParameters::parse(&header).unwrap();
            assert_eq!(params.timestamp.to_string(), canonical);
        }
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let secret = Secret::new("Jefe");
        let mut mac = secret.mac();
        mac.update(b"what do ya want for nothing?");
        let expected_hex = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";
        let raw = mac.finalize().into_bytes();
        let hex: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(hex, expected_hex);

        assert_eq!(
            sign("what do ya want for nothing?", &secret),
            STANDARD.encode(raw)
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let signer = RequestSigner::new("k1", "secret");
        let ctx = SigningContext::post("h", "/p");
        let headers = HeaderSet::new().with("Host", "h");

        let a = signer.sign_request_with(&ctx, &headers, b"{}", 1700000000, "n1");
        let b = signer.sign_request_with(&ctx, &headers, b"{}", 1700000000, "n1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let signer = RequestSigner::new("k1", "secret");
        let ctx = SigningContext::post("h", "/p");
        let headers = HeaderSet::new().with("Host", "h");

        let a = signer.sign_request(&ctx, &headers, b"{}");
        let b = signer.sign_request(&ctx, &headers, b"{}");
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_encoding_changes_signature() {
        let s = "POST\nh\n/p";
        let secret = Secret::new("secret");
        assert_ne!(
            sign_with_encoding(s, &secret, SigningStringEncoding::Raw),
            sign_with_encoding(s, &secret, SigningStringEncoding::JsonEscaped)
        );
    }

    #[test]
    fn test_verify_signature_rejects_garbage() {
        let secret = Secret::new("secret");
        let err = verify_signature("x", &secret, SigningStringEncoding::Raw, "not base64!").unwrap_err();
        assert!(matches!(err, WebhookError::SignatureMismatch));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("super-secret");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
    }

    #[test]
    fn test_algorithm_tag() {
        assert_eq!(Algorithm::HmacSha256.as_str(), "hmac-sha256");
        assert!("hmac-sha512".parse::<Algorithm>().is_err());
    }
}
