//! Content digests inserted into the signing string

use crate::{Result, WebhookError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Ordered set of headers covered by a signature
///
/// Names are folded to lower case on insertion. Order follows insertion,
/// which is always the caller's selection list, never request arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_ascii_lowercase(), value.into()));
    }

    /// Append a header, builder style
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Select `names` from a list of request headers
    ///
    /// Lookup is case-insensitive. The first name the request does not carry
    /// is reported, lowercased, as [`WebhookError::MissingSignedHeader`].
    pub fn select<N, K, V>(names: &[N], headers: &[(K, V)]) -> Result<Self>
    where
        N: AsRef<str>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.as_ref();
            let value = headers
                .iter()
                .find(|(k, _)| k.as_ref().eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_ref())
                .ok_or_else(|| WebhookError::MissingSignedHeader(name.to_ascii_lowercase()))?;
            set.push(name, value);
        }
        Ok(set)
    }

    /// Lower-cased header names, in order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The text that is hashed: `name:value\n` per header
    pub fn canonical_block(&self) -> String {
        let mut block = String::new();
        for (name, value) in &self.entries {
            block.push_str(name);
            block.push(':');
            block.push_str(value);
            block.push('\n');
        }
        block
    }
}

/// SHA-256 of arbitrary bytes, base64 encoded
pub fn sha256_base64(data: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(data))
}

/// Digest of the canonical header block
pub fn hash_headers(headers: &HeaderSet) -> String {
    sha256_base64(headers.canonical_block().as_bytes())
}

/// Digest of the body bytes exactly as transmitted
pub fn hash_body(body: &[u8]) -> String {
    sha256_base64(body)
}

/// Serialize a payload to the bytes that will be sent
///
/// Hash these bytes with [`hash_body`] and send the very same buffer; never
/// re-serialize between hashing and sending.
pub fn encode_body<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    #[test]
    fn test_canonical_block() {
        let headers = HeaderSet::new()
            .with("Content-Type", "application/json")
            .with("Host", "x");

        assert_eq!(
            headers.canonical_block(),
            "content-type:application/json\nhost:x\n"
        );
        assert_eq!(headers.names(), vec!["content-type", "host"]);
    }

    #[test]
    fn test_hash_headers_matches_independent_digest() {
        let request_headers = vec![
            ("Host".to_string(), "x".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let headers = HeaderSet::select(&["Content-Type", "Host"], &request_headers).unwrap();

        let expected = STANDARD.encode(Sha256::digest(b"content-type:application/json\nhost:x\n"));
        assert_eq!(hash_headers(&headers), expected);
        assert_eq!(hash_headers(&headers), "Agc2wuTO1weGUoZKKBmZHRHfWoW/iCdYTYvdJ57c1AA=");
    }

    #[test]
    fn test_header_order_changes_digest() {
        let a = HeaderSet::new().with("host", "x").with("content-type", "application/json");
        let b = HeaderSet::new().with("content-type", "application/json").with("host", "x");
        assert_ne!(hash_headers(&a), hash_headers(&b));
    }

    #[test]
    fn test_select_is_case_insensitive() {
        let request_headers = [("CONTENT-TYPE", "application/json"), ("host", "x")];
        let headers = HeaderSet::select(&["content-type", "HOST"], &request_headers).unwrap();
        assert_eq!(headers.canonical_block(), "content-type:application/json\nhost:x\n");
    }

    #[test]
    fn test_select_reports_missing_header() {
        let request_headers = [("host", "x")];
        let err = HeaderSet::select(&["Host", "Content-Type"], &request_headers).unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignedHeader(name) if name == "content-type"));
    }

    #[test]
    fn test_hash_body_known_vector() {
        // sha256("") base64
        assert_eq!(hash_body(b""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[test]
    fn test_body_whitespace_changes_digest() {
        assert_ne!(hash_body(br#"{"a":1}"#), hash_body(br#"{"a": 1}"#));
    }

    #[test]
    fn test_encode_body_preserves_key_order() {
        #[derive(Serialize)]
        struct Ordered {
            zeta: u8,
            alpha: u8,
        }

        let bytes = encode_body(&Ordered { zeta: 1, alpha: 2 }).unwrap();
        assert_eq!(bytes, br#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_encode_body_failure_is_serialization_error() {
        struct Unserializable;

        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(
                &self,
                _serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(S::Error::custom("cycle detected"))
            }
        }

        let err = encode_body(&Unserializable).unwrap_err();
        assert!(matches!(err, WebhookError::SerializationError(msg) if msg.contains("cycle")));
    }
}
