// Process settings, validated once at startup

use crate::{ConfigError, ConfigValidator, EnvLoader, Result, Validate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const WEBHOOKS_SECRET: &str = "webhooks_secret";
pub const WEBHOOKS_KEY_ID: &str = "webhooks_key_id";
pub const WEBHOOKS_BASE_URL: &str = "webhooks_base_url";
pub const WEBHOOKS_PARTNER: &str = "webhooks_partner";
pub const WEBHOOKS_GROUP_ID: &str = "webhooks_group_id";
pub const WEBHOOKS_TIMEOUT_SECS: &str = "webhooks_timeout_secs";
pub const WEBHOOKS_LEGACY_ENVELOPE: &str = "webhooks_legacy_envelope";
pub const LOG_LEVEL: &str = "hubmock_log_level";
pub const LOG_FORMAT: &str = "hubmock_log_format";

/// Settings for the webhook side of the mock backend
///
/// The secret is mandatory: a process that cannot sign must not start.
#[derive(Clone, Serialize)]
pub struct Settings {
    #[serde(skip_serializing)]
    pub webhooks_secret: String,
    pub webhooks_key_id: String,
    pub webhooks_base_url: String,
    /// `None` posts to `/webhooks/<type>` directly
    pub webhooks_partner: Option<String>,
    pub webhooks_group_id: String,
    pub webhooks_timeout_secs: u64,
    pub webhooks_legacy_envelope: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::ParseError {
                key: LOG_FORMAT.to_string(),
                message: format!("unknown format {}", other),
            }),
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_file(None)
    }

    /// Load an explicit `.env` file, then the process environment
    pub fn from_env_file(path: Option<&Path>) -> Result<Self> {
        EnvLoader::load_dotenv(path)?;
        let vars = EnvLoader::new(None).load();
        Self::from_map(&vars)
    }

    /// Build settings from lower-cased key/value pairs
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let webhooks_secret = vars
            .get(WEBHOOKS_SECRET)
            .cloned()
            .ok_or_else(|| ConfigError::Missing(WEBHOOKS_SECRET.to_uppercase()))?;

        // An explicitly empty partner disables the segment
        let webhooks_partner = match vars.get(WEBHOOKS_PARTNER) {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(p.trim().to_string()),
            None => Some("medesync".to_string()),
        };

        let settings = Self {
            webhooks_secret,
            webhooks_key_id: get(WEBHOOKS_KEY_ID).unwrap_or("hubmock").to_string(),
            webhooks_base_url: get(WEBHOOKS_BASE_URL)
                .unwrap_or("http://localhost:3000")
                .to_string(),
            webhooks_partner,
            webhooks_group_id: get(WEBHOOKS_GROUP_ID).unwrap_or("212").to_string(),
            webhooks_timeout_secs: parse_or(get(WEBHOOKS_TIMEOUT_SECS), WEBHOOKS_TIMEOUT_SECS, 30)?,
            webhooks_legacy_envelope: parse_bool(get(WEBHOOKS_LEGACY_ENVELOPE), WEBHOOKS_LEGACY_ENVELOPE)?,
            log_level: get(LOG_LEVEL).unwrap_or("info").to_string(),
            log_format: get(LOG_FORMAT)
                .map(LogFormat::from_str)
                .transpose()?
                .unwrap_or_default(),
        };

        settings.validate()?;
        debug!(
            base_url = %settings.webhooks_base_url,
            key_id = %settings.webhooks_key_id,
            "Loaded settings"
        );
        Ok(settings)
    }
}

fn parse_or<T: FromStr>(value: Option<&str>, key: &str, default: T) -> Result<T>
where
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_uppercase(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<&str>, key: &str) -> Result<bool> {
    match value.map(str::to_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::ParseError {
            key: key.to_uppercase(),
            message: format!("expected a boolean, got {}", other),
        }),
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.webhooks_secret, "WEBHOOKS_SECRET")?;
        ConfigValidator::not_empty(&self.webhooks_key_id, "WEBHOOKS_KEY_ID")?;
        if self.webhooks_key_id.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(
                "WEBHOOKS_KEY_ID cannot contain whitespace".to_string(),
            ));
        }
        ConfigValidator::is_url(&self.webhooks_base_url, "WEBHOOKS_BASE_URL")?;
        if let Some(partner) = &self.webhooks_partner {
            ConfigValidator::is_path_segment(partner, "WEBHOOKS_PARTNER")?;
        }
        ConfigValidator::in_range(self.webhooks_timeout_secs, 1, 300, "WEBHOOKS_TIMEOUT_SECS")?;
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("webhooks_secret", &"***")
            .field("webhooks_key_id", &self.webhooks_key_id)
            .field("webhooks_base_url", &self.webhooks_base_url)
            .field("webhooks_partner", &self.webhooks_partner)
            .field("webhooks_group_id", &self.webhooks_group_id)
            .field("webhooks_timeout_secs", &self.webhooks_timeout_secs)
            .field("webhooks_legacy_envelope", &self.webhooks_legacy_envelope)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}
