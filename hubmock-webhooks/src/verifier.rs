//! Verification of inbound `Signature` authorization headers

use crate::canonical::{SigningContext, SigningStringEncoding, build_signing_string};
use crate::digest::{HeaderSet, hash_body, hash_headers};
use crate::signature::{Algorithm, Secret, SignatureParameters, verify_signature};
use crate::{Result, WebhookError};
use std::collections::HashMap;
use tracing::debug;

/// Resolves a key id to its shared secret
pub trait SecretLookup {
    fn secret_for(&self, key_id: &str) -> Option<&Secret>;
}

impl SecretLookup for HashMap<String, Secret> {
    fn secret_for(&self, key_id: &str) -> Option<&Secret> {
        self.get(key_id)
    }
}

/// Key ids and their secrets
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<String, Secret>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring holding a single key
    pub fn single(key_id: impl Into<String>, secret: impl Into<Secret>) -> Self {
        Self::new().with_key(key_id, secret)
    }

    /// Add a key
    pub fn with_key(mut self, key_id: impl Into<String>, secret: impl Into<Secret>) -> Self {
        self.keys.insert(key_id.into(), secret.into());
        self
    }
}

impl SecretLookup for KeyRing {
    fn secret_for(&self, key_id: &str) -> Option<&Secret> {
        self.keys.get(key_id)
    }
}

/// The parts of a live request that a signature covers
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    pub host: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl InboundRequest {
    /// Create a request with the given method, host and path
    ///
    /// The host is also recorded as a `Host` header, as an HTTP server would
    /// see it.
    pub fn new(method: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            method: method.into(),
            headers: vec![("Host".to_string(), host.clone())],
            host,
            path: path.into(),
            query: String::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Add a header; an existing header with the same name is replaced
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn signing_context(&self) -> SigningContext {
        SigningContext::new(&self.method, &self.host, &self.path, &self.query)
    }
}

/// Verifies `Signature` authorization headers against live requests
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    encoding: SigningStringEncoding,
    tolerance_secs: Option<u64>,
}

impl SignatureVerifier {
    /// Verifier with raw encoding and no freshness window
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a signer that HMACs the JSON-escaped signing string
    pub fn with_encoding(mut self, encoding: SigningStringEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Reject signatures whose timestamp is further than `seconds` from now
    pub fn with_tolerance(mut self, seconds: u64) -> Self {
        self.tolerance_secs = Some(seconds);
        self
    }

    /// Verify `authorization` against `request`
    ///
    /// Every failure after the header is parsed and the key resolved is
    /// reported as [`WebhookError::SignatureMismatch`], whichever part of the
    /// request differed.
    pub fn verify(
        &self,
        authorization: &str,
        request: &InboundRequest,
        secrets: &impl SecretLookup,
    ) -> Result<SignatureParameters> {
        let params = SignatureParameters::parse(authorization)?;
        params.algorithm.parse::<Algorithm>()?;

        let secret = secrets
            .secret_for(&params.key_id)
            .ok_or_else(|| WebhookError::UnknownKeyId(params.key_id.clone()))?;

        if let Some(tolerance) = self.tolerance_secs {
            let age = chrono::Utc::now().timestamp().abs_diff(params.timestamp);
            if age > tolerance {
                return Err(WebhookError::TimestampOutsideWindow { age, tolerance });
            }
        }

        let headers = HeaderSet::select(&params.headers, &request.headers).map_err(|e| {
            debug!(error = %e, "signed header absent from request");
            WebhookError::SignatureMismatch
        })?;

        let signing_string = build_signing_string(
            &request.signing_context(),
            &hash_headers(&headers),
            &hash_body(&request.body),
            &params.key_id,
            params.timestamp,
            &params.nonce,
        );

        verify_signature(&signing_string, secret, self.encoding, &params.signature)?;
        Ok(params)
    }

    /// Verify, collapsing every failure to `false`
    pub fn is_valid(
        &self,
        authorization: &str,
        request: &InboundRequest,
        secrets: &impl SecretLookup,
    ) -> bool {
        self.verify(authorization, request, secrets).is_ok()
    }
}
