//! Record entity - a business record read through the record store

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Raw field values accepted by create/write, keyed by field name
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Reference to another record together with its display name
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub model: String,
    pub id: i64,
    pub display_name: String,
}

impl RecordRef {
    pub fn new(model: impl Into<String>, id: i64, display_name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            id,
            display_name: display_name.into(),
        }
    }
}

// Identity is (model, id); the display name is derived data
impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.id == other.id
    }
}

/// A resolved field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Arbitrary precision number kept in its textual form
    Numeric(String),
    /// Char, text and selection keys
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// many2one / reference
    Relation(Option<RecordRef>),
    /// one2many / many2many
    Relations(Vec<RecordRef>),
}

impl FieldValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Relation(None))
    }

    /// Text content, if this is a textual value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Numeric(s) => Some(s),
            _ => None,
        }
    }

    /// Referenced record, if this is a single relation
    pub fn as_relation(&self) -> Option<&RecordRef> {
        match self {
            Self::Relation(r) => r.as_ref(),
            _ => None,
        }
    }
}

/// A business record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub model: String,
    pub id: i64,
    pub display_name: String,
    pub values: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Value of a field; `None` when the field was not resolved
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Reference to this record
    pub fn to_ref(&self) -> RecordRef {
        RecordRef::new(self.model.clone(), self.id, self.display_name.clone())
    }
}
