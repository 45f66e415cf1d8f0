//! Model registry entities - reflection of the registered business models

use serde::{Deserialize, Serialize};

/// Fields carrying record identity and audit metadata
pub const AUDIT_METADATA_FIELDS: &[&str] = &[
    "id",
    "create_uid",
    "write_uid",
    "create_date",
    "write_date",
    "rec_name",
];

/// One option of a selection field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub value: String,
    pub label: String,
}

impl SelectionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Declared kind of a field
///
/// The set is closed: rendering and storage strategies are selected with a
/// `match` on this tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Char,
    Text,
    Integer,
    Float,
    Numeric,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Selection {
        options: Vec<SelectionOption>,
    },
    Many2One {
        target: String,
    },
    /// Stored as `"model,id"`
    Reference,
    One2Many {
        target: String,
        inverse: String,
    },
    Many2Many {
        target: String,
        link_table: String,
        origin: String,
        link_target: String,
    },
}

impl FieldKind {
    /// Type tag as stored in the registry
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Selection { .. } => "selection",
            Self::Many2One { .. } => "many2one",
            Self::Reference => "reference",
            Self::One2Many { .. } => "one2many",
            Self::Many2Many { .. } => "many2many",
        }
    }

    /// List-valued relational field (not stored in the model's own table)
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::One2Many { .. } | Self::Many2Many { .. })
    }

    /// Single-valued relational field rendered by display name
    #[inline]
    pub fn is_reference_like(&self) -> bool {
        matches!(self, Self::Many2One { .. } | Self::Reference)
    }

    /// Label of a selection value, if this is a selection field with that option
    pub fn selection_label(&self, value: &str) -> Option<&str> {
        match self {
            Self::Selection { options } => options
                .iter()
                .find(|o| o.value == value)
                .map(|o| o.label.as_str()),
            _ => None,
        }
    }
}

/// A declared field of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }

    /// Identity or audit metadata field
    pub fn is_audit_metadata(&self) -> bool {
        AUDIT_METADATA_FIELDS.contains(&self.name.as_str())
    }
}

/// A registered business model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Dotted model name (e.g. `sale.order`)
    pub name: String,
    /// Human readable label
    pub label: String,
    /// Backing table
    pub table: String,
    /// Historized storage in `<table>__history`
    pub history: bool,
    /// Computed/virtual model without a table of its own
    pub computed: bool,
    /// Field used to build display names
    pub rec_name: String,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the history shadow table
    pub fn history_table(&self) -> String {
        format!("{}__history", self.table)
    }

    /// Fields stored as columns of the model's table, the ones compared when
    /// diffing two states of a record
    pub fn column_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| !f.kind.is_list() && !f.is_audit_metadata())
    }

    /// Fallback display name when the rec_name field is empty
    pub fn fallback_display_name(&self, id: i64) -> String {
        format!("{},{}", self.name, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_model() -> ModelDescriptor {
        ModelDescriptor {
            name: "sale.order".to_string(),
            label: "Sale Order".to_string(),
            table: "sale_order".to_string(),
            history: true,
            computed: false,
            rec_name: "name".to_string(),
            fields: vec![
                FieldDescriptor::new("id", "ID", FieldKind::Integer),
                FieldDescriptor::new("name", "Name", FieldKind::Char),
                FieldDescriptor::new(
                    "party",
                    "Party",
                    FieldKind::Many2One {
                        target: "party.party".to_string(),
                    },
                ),
                FieldDescriptor::new(
                    "lines",
                    "Lines",
                    FieldKind::One2Many {
                        target: "sale.line".to_string(),
                        inverse: "order".to_string(),
                    },
                ),
                FieldDescriptor::new("write_date", "Edited at", FieldKind::DateTime),
            ],
        }
    }

    #[test]
    fn test_history_table() {
        assert_eq!(order_model().history_table(), "sale_order__history");
    }

    #[test]
    fn test_column_fields_skip_metadata_and_lists() {
        let model = order_model();
        let names: Vec<&str> = model.column_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "party"]);
    }

    #[test]
    fn test_selection_label() {
        let kind = FieldKind::Selection {
            options: vec![
                SelectionOption::new("high", "High"),
                SelectionOption::new("low", "Low"),
            ],
        };
        assert_eq!(kind.selection_label("low"), Some("Low"));
        assert_eq!(kind.selection_label("medium"), None);
        assert_eq!(FieldKind::Char.selection_label("low"), None);
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(FieldKind::DateTime.tag(), "datetime");
        assert!(FieldKind::Many2Many {
            target: "a".to_string(),
            link_table: "b".to_string(),
            origin: "c".to_string(),
            link_target: "d".to_string(),
        }
        .is_list());
        assert!(FieldKind::Reference.is_reference_like());
        assert!(!FieldKind::Char.is_reference_like());
    }
}
