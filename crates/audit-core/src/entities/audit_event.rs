//! Audit event entity - one row of the virtual audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value_objects::EventKey;

/// Kind of change recorded by an audit event
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Create,
    Write,
    Delete,
}

impl EventType {
    pub const ALL: [EventType; 3] = [Self::Create, Self::Write, Self::Delete];

    /// Tag used in keys, queries and SQL literals
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Write => "Modify",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

/// A synthesized audit event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub user_id: Option<i64>,
    pub date: DateTime<Utc>,
    pub model: String,
    pub record_id: i64,
    /// History row id for historized rows, record id otherwise
    pub revision: i64,
    pub history: bool,
    /// Change summary, one `label: old → new` line per field
    pub changes: String,
}

impl AuditEvent {
    /// Composite key of this event
    pub fn key(&self) -> EventKey {
        EventKey::new(
            self.model.clone(),
            self.record_id,
            self.event_type,
            self.revision,
        )
    }

    #[inline]
    pub fn is_write(&self) -> bool {
        self.event_type == EventType::Write
    }
}

/// Filters applied when building the audit log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogQuery {
    /// Acting users; empty means any
    #[serde(default)]
    pub users: Vec<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Event types; empty means all
    #[serde(default)]
    pub event_types: Vec<EventType>,
    /// Model names; empty means all
    #[serde(default)]
    pub models: Vec<String>,
    /// Case-insensitive substring filter over change summaries
    pub changes: Option<String>,
    pub limit: Option<i64>,
}

impl AuditLogQuery {
    /// Check whether an event type is selected
    pub fn wants(&self, event_type: EventType) -> bool {
        self.event_types.is_empty() || self.event_types.contains(&event_type)
    }

    /// Check whether a model is selected
    pub fn wants_model(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m == model)
    }

    /// Free-text filter, trimmed and ignored when blank
    pub fn changes_filter(&self) -> Option<&str> {
        self.changes
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_roundtrip() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert!("update".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_serde() {
        let json = serde_json::to_string(&EventType::Delete).unwrap();
        assert_eq!(json, "\"delete\"");
    }

    #[test]
    fn test_query_filters() {
        let query = AuditLogQuery {
            event_types: vec![EventType::Delete],
            models: vec!["sale.order".to_string()],
            changes: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(query.wants(EventType::Delete));
        assert!(!query.wants(EventType::Create));
        assert!(query.wants_model("sale.order"));
        assert!(!query.wants_model("party.party"));
        assert_eq!(query.changes_filter(), None);

        let any = AuditLogQuery::default();
        assert!(any.wants(EventType::Write));
        assert!(any.wants_model("party.party"));
    }

    #[test]
    fn test_event_key() {
        let event = AuditEvent {
            event_type: EventType::Write,
            user_id: Some(1),
            date: Utc::now(),
            model: "sale.order".to_string(),
            record_id: 5,
            revision: 17,
            history: true,
            changes: String::new(),
        };
        assert_eq!(event.key().to_string(), "sale.order:5:write:17");
        assert!(event.is_write());
    }
}
