//! Delivery outcome records

use crate::{Action, EventType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Not attempted yet
    Pending,

    /// The hub answered with a 2xx status
    Succeeded,

    /// The hub answered with a non-2xx status
    Rejected,

    /// No response: connection, TLS or timeout failure
    TransportFailed,

    /// The request could not be built (serialization, URL)
    Aborted,
}

impl DeliveryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// What happened to one dispatched webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub id: String,
    pub event_type: EventType,
    pub action: Action,
    pub url: String,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub last_status_code: Option<u16>,
    pub last_error: Option<String>,
    pub last_response_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeliveryOutcome {
    pub fn new(event_type: EventType, action: Action, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            action,
            url: url.into(),
            status: DeliveryStatus::Pending,
            attempts: 0,
            last_status_code: None,
            last_error: None,
            last_response_body: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub(crate) fn record_response(&mut self, status_code: u16, body: Option<String>) {
        self.attempts += 1;
        self.last_status_code = Some(status_code);
        self.last_response_body = body.map(|s| truncate(&s, 1024));
        if (200..300).contains(&status_code) {
            self.status = DeliveryStatus::Succeeded;
            self.last_error = None;
        } else {
            self.status = DeliveryStatus::Rejected;
            self.last_error = Some(format!("HTTP {}", status_code));
        }
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn record_transport_error(&mut self, error: String) {
        self.attempts += 1;
        self.status = DeliveryStatus::TransportFailed;
        self.last_status_code = None;
        self.last_error = Some(error);
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn abort(&mut self, error: String) {
        self.status = DeliveryStatus::Aborted;
        self.last_error = Some(error);
        self.completed_at = Some(Utc::now());
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len - 3;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
