//! Canonical request encoding
//!
//! The signing string is the newline-separated text the HMAC is computed
//! over. Signer and verifier must produce it byte-for-byte identically, so
//! every slot is always present, even when empty.

use std::borrow::Cow;

/// Method used for every outbound webhook
pub const WEBHOOK_METHOD: &str = "POST";

/// The request coordinates covered by a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// HTTP method, upper case
    pub method: String,

    /// Host as sent in the `Host` header (`host` or `host:port`)
    pub host: String,

    /// Request path, starting with `/`
    pub path: String,

    /// Raw query string without the leading `?`, empty if absent
    pub query: String,
}

impl SigningContext {
    /// Create a context for a `POST` to the given host and path
    pub fn post(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: WEBHOOK_METHOD.to_string(),
            host: host.into(),
            path: path.into(),
            query: String::new(),
        }
    }

    /// Create a context with an explicit method
    pub fn new(
        method: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            host: host.into(),
            path: path.into(),
            query: query.into(),
        }
    }

    /// Set the query string
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Build a context from a target URL
    ///
    /// The host carries the port only when it is not the scheme default,
    /// which is what HTTP clients put in the `Host` header.
    pub fn from_url(method: impl Into<String>, url: &url::Url) -> Self {
        Self {
            method: method.into(),
            host: host_header_value(url),
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
        }
    }
}

/// `Host` header value for a URL
pub fn host_header_value(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Build the signing string
///
/// Layout, one slot per line:
///
/// ```text
/// method
/// host
/// path
/// query
/// header digest
/// body digest
///
/// key id
/// timestamp
/// nonce
/// ```
///
/// The nonce line has no trailing newline.
pub fn build_signing_string(
    ctx: &SigningContext,
    header_digest: &str,
    body_digest: &str,
    key_id: &str,
    timestamp: i64,
    nonce: &str,
) -> String {
    let mut out = String::with_capacity(
        ctx.method.len()
            + ctx.host.len()
            + ctx.path.len()
            + ctx.query.len()
            + header_digest.len()
            + body_digest.len()
            + key_id.len()
            + nonce.len()
            + 32,
    );

    for line in [
        ctx.method.as_str(),
        ctx.host.as_str(),
        ctx.path.as_str(),
        ctx.query.as_str(),
        header_digest,
        body_digest,
        "",
        key_id,
    ] {
        out.push_str(line);
        out.push('\n');
    }

    // i64 Display is plain base-10 with no grouping
    out.push_str(&timestamp.to_string());
    out.push('\n');
    out.push_str(nonce);
    out
}

/// How the signing string is turned into HMAC input
///
/// Some partners compute the HMAC over the JSON-escaped form of the signing
/// string (a JSON string literal with its surrounding quotes removed). The
/// two forms differ as soon as the string contains a newline, which it always
/// does, so signer and verifier must agree on this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningStringEncoding {
    /// HMAC over the raw bytes of the signing string
    #[default]
    Raw,

    /// HMAC over the JSON-escaped signing string without quotes
    JsonEscaped,
}

impl SigningStringEncoding {
    /// Produce the bytes the HMAC is computed over
    pub fn apply<'a>(&self, signing_string: &'a str) -> Cow<'a, str> {
        match self {
            Self::Raw => Cow::Borrowed(signing_string),
            Self::JsonEscaped => {
                let quoted = serde_json::Value::String(signing_string.to_string()).to_string();
                Cow::Owned(quoted[1..quoted.len() - 1].to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_string_layout() {
        let ctx = SigningContext::post("hub.example.com", "/webhooks/medesync/appointments");
        let s = build_signing_string(&ctx, "HD==", "BD==", "k1", 1700000000, "n1");

        assert_eq!(
            s,
            "POST\nhub.example.com\n/webhooks/medesync/appointments\n\nHD==\nBD==\n\nk1\n1700000000\nn1"
        );
    }

    #[test]
    fn test_empty_query_keeps_its_line() {
        let ctx = SigningContext::post("h", "/p");
        let s = build_signing_string(&ctx, "a", "b", "k", 1, "n");

        let lines: Vec<&str> = s.split('\n').collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[3], "");
        assert_eq!(lines[6], "");
        assert!(!s.ends_with('\n'));
    }

    #[test]
    fn test_query_is_included() {
        let ctx = SigningContext::post("h", "/p").with_query("a=1&b=2");
        let s = build_signing_string(&ctx, "a", "b", "k", 1, "n");
        assert!(s.starts_with("POST\nh\n/p\na=1&b=2\n"));
    }

    #[test]
    fn test_signing_string_is_deterministic() {
        let ctx = SigningContext::post("h", "/p");
        let a = build_signing_string(&ctx, "x", "y", "k", 42, "n");
        let b = build_signing_string(&ctx, "x", "y", "k", 42, "n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_context_from_url() {
        let url = url::Url::parse("http://localhost:3000/webhooks/medesync/patients?x=1").unwrap();
        let ctx = SigningContext::from_url("POST", &url);

        assert_eq!(ctx.host, "localhost:3000");
        assert_eq!(ctx.path, "/webhooks/medesync/patients");
        assert_eq!(ctx.query, "x=1");
    }

    #[test]
    fn test_context_from_url_default_port() {
        let url = url::Url::parse("https://hub.example.com:443/webhooks/services").unwrap();
        let ctx = SigningContext::from_url("POST", &url);

        assert_eq!(ctx.host, "hub.example.com");
        assert_eq!(ctx.query, "");
    }

    #[test]
    fn test_json_escaped_encoding() {
        let raw = "POST\nh\n/p";
        assert_eq!(SigningStringEncoding::Raw.apply(raw), raw);
        assert_eq!(SigningStringEncoding::JsonEscaped.apply(raw), "POST\\nh\\n/p");
        assert_eq!(
            SigningStringEncoding::JsonEscaped.apply("a\"b\\c"),
            "a\\\"b\\\\c"
        );
    }
}
