//! Event key - composite identifier of a row in the virtual audit log
//!
//! Rows of the audit log come from heterogeneous per-model subqueries, so no
//! single column identifies them. The key combines:
//! - the model name
//! - the record id
//! - the event type
//! - the revision (history row id for historized models, record id otherwise)
//!
//! Textual form: `model:record_id:event_type:revision`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::entities::EventType;

/// Composite key of an audit event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub model: String,
    pub record_id: i64,
    pub event_type: EventType,
    pub revision: i64,
}

impl EventKey {
    /// Create a new key
    pub fn new(model: impl Into<String>, record_id: i64, event_type: EventType, revision: i64) -> Self {
        Self {
            model: model.into(),
            record_id,
            event_type,
            revision,
        }
    }

    /// Parse from the textual form
    pub fn parse(s: &str) -> Result<Self, EventKeyParseError> {
        let mut parts = s.rsplitn(4, ':');
        let revision = parts.next().ok_or(EventKeyParseError::InvalidFormat)?;
        let event_type = parts.next().ok_or(EventKeyParseError::InvalidFormat)?;
        let record_id = parts.next().ok_or(EventKeyParseError::InvalidFormat)?;
        let model = parts.next().ok_or(EventKeyParseError::InvalidFormat)?;

        if model.is_empty() {
            return Err(EventKeyParseError::InvalidFormat);
        }

        Ok(Self {
            model: model.to_string(),
            record_id: record_id
                .parse()
                .map_err(|_| EventKeyParseError::InvalidNumber)?,
            event_type: event_type
                .parse()
                .map_err(|_| EventKeyParseError::InvalidEventType)?,
            revision: revision
                .parse()
                .map_err(|_| EventKeyParseError::InvalidNumber)?,
        })
    }
}

/// Error when parsing an EventKey from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventKeyParseError {
    #[error("invalid event key format")]
    InvalidFormat,
    #[error("invalid number in event key")]
    InvalidNumber,
    #[error("invalid event type in event key")]
    InvalidEventType,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.model,
            self.record_id,
            self.event_type.as_str(),
            self.revision
        )
    }
}

impl FromStr for EventKey {
    type Err = EventKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKey::parse(s)
    }
}

impl Serialize for EventKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EventKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EventKey::parse(&s).map_err(serde::de::Error::custom)
    }
}
