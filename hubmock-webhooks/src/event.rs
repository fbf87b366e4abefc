//! Webhook events and the envelope sent to the hub

use crate::WebhookError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Resource kind a webhook is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Availability,
    Appointment,
    Resource,
    Patient,
    Service,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::Availability,
        Self::Appointment,
        Self::Resource,
        Self::Patient,
        Self::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Availability => "availability",
            Self::Appointment => "appointment",
            Self::Resource => "resource",
            Self::Patient => "patient",
            Self::Service => "service",
        }
    }

    /// URL path segment the hub listens on
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Availability => "availabilities",
            Self::Appointment => "appointments",
            Self::Resource => "resources",
            Self::Patient => "patients",
            Self::Service => "services",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = WebhookError;

    /// Accepts the singular name or the plural path segment
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.path_segment() == s)
            .ok_or_else(|| WebhookError::Config(format!("unknown event type: {}", s)))
    }
}

/// What happened to the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(WebhookError::Config(format!("unknown action: {}", other))),
        }
    }
}

/// A change to dispatch to the hub
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event_type: EventType,
    pub action: Action,

    /// Opaque resource payload, hashed but never interpreted
    pub payload: serde_json::Value,
}

impl WebhookEvent {
    pub fn new(event_type: EventType, action: Action) -> Self {
        Self {
            event_type,
            action,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Body posted to the hub
///
/// Field order here is the order on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub request_action: Action,
    pub group_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,

    pub data: serde_json::Value,
}

impl WebhookEnvelope {
    /// Envelope with the current field set
    pub fn new(action: Action, group_id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            request_action: action,
            group_id: group_id.into(),
            uuid: None,
            last_modified_date: None,
            data,
        }
    }

    /// Add the `uuid` and `last_modified_date` fields older hub versions expect
    pub fn with_legacy_fields(mut self, uuid: Uuid, last_modified: DateTime<Utc>) -> Self {
        self.uuid = Some(uuid);
        self.last_modified_date = Some(last_modified);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_type_parsing() {
        assert_eq!("appointment".parse::<EventType>().unwrap(), EventType::Appointment);
        assert_eq!("availabilities".parse::<EventType>().unwrap(), EventType::Availability);
        assert_eq!("Patients".parse::<EventType>().unwrap(), EventType::Patient);
        assert!("doctor".parse::<EventType>().is_err());
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(EventType::Service.path_segment(), "services");
        assert_eq!(EventType::Resource.path_segment(), "resources");
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("DELETE".parse::<Action>().unwrap(), Action::Delete);
        assert!("upsert".parse::<Action>().is_err());
    }

    #[test]
    fn test_envelope_wire_form() {
        let envelope = WebhookEnvelope::new(
            Action::Create,
            "212",
            serde_json::json!({"id": "a1"}),
        );
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"request_action":"create","group_id":"212","data":{"id":"a1"}}"#
        );
    }

    #[test]
    fn test_legacy_envelope_wire_form() {
        let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let envelope = WebhookEnvelope::new(Action::Update, "212", serde_json::json!("blop"))
            .with_legacy_fields(uuid, at);

        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"request_action":"update","group_id":"212","uuid":"67e55044-10b1-426f-9247-bb680e5fe0c8","last_modified_date":"2024-03-01T12:30:00Z","data":"blop"}"#
        );
    }
}
