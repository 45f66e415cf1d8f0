//! Notification entities - rules watching fields, staged changes and queued tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::value_objects::WatchedField;

/// Notification rule - emails a destination when a watched field changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRule {
    pub id: i64,
    pub name: String,
    /// Destination address
    pub email: String,
    /// Bound outbound mail server, default SMTP settings when unset
    pub mail_server_id: Option<i64>,
    pub targets: Vec<WatchedField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRule {
    /// Check whether this rule watches a field
    pub fn watches(&self, model: &str, field: &str) -> bool {
        self.targets
            .iter()
            .any(|t| t.model == model && t.field == field)
    }
}

/// Input for creating or replacing a notification rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewNotificationRule {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub mail_server_id: Option<i64>,
    #[validate(length(min = 1))]
    pub targets: Vec<WatchedField>,
}

/// One change observed by the field-watch interceptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedChange {
    pub model: String,
    pub field: String,
    pub field_label: String,
    /// Record id, or a negative per-row counter before creation completes
    pub record_key: i64,
    pub record_name: String,
    /// Normalized value before the write; `None` on create
    pub old_value: Option<String>,
    pub current_value: String,
}

impl StagedChange {
    pub fn watched_field(&self) -> WatchedField {
        WatchedField::new(self.model.clone(), self.field.clone())
    }
}

/// Payload of a queued notification mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTask {
    pub rule_id: i64,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<StagedChange>,
}

/// A task held by the background queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub queue: String,
    pub payload: serde_json::Value,
    /// Earliest time the task may run
    pub eta: DateTime<Utc>,
    pub enqueued_at: DateTime<Utc>,
    /// Monotonic tiebreak among tasks sharing an eta, assigned by the queue
    #[serde(default)]
    pub sequence: u64,
}

impl QueuedTask {
    pub fn new(queue: impl Into<String>, payload: serde_json::Value, eta: DateTime<Utc>) -> Self {
        Self {
            queue: queue.into(),
            payload,
            eta,
            enqueued_at: Utc::now(),
            sequence: 0,
        }
    }

    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.eta <= now
    }
}
