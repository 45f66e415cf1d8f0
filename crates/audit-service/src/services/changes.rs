//! Change summaries of audit events
//!
//! A write event is explained by comparing the record one microsecond before
//! the event with the record at the event. Each differing field yields one
//! `label: old → new` line.

use chrono::Duration;
use tracing::{instrument, warn};

use audit_core::entities::{AuditEvent, ModelDescriptor, Record};

use crate::render::display_value;

use super::context::ServiceContext;

/// Diff two states of a record over its column fields
///
/// Fields missing from either side are skipped.
pub fn diff_records(model: &ModelDescriptor, before: &Record, after: &Record) -> String {
    model
        .column_fields()
        .filter_map(|field| {
            let old = before.get(&field.name)?;
            let new = after.get(&field.name)?;
            if old == new {
                return None;
            }
            Some(format!(
                "{}: {} → {}",
                field.label,
                display_value(&field.kind, old),
                display_value(&field.kind, new)
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Change summary service
pub struct ChangeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChangeService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Change summary of an event
    ///
    /// Empty for non-write events, non-historized models and whenever one
    /// side of the comparison cannot be read.
    #[instrument(skip(self, model, event), fields(key = %event.key()))]
    pub async fn changes_for(&self, model: &ModelDescriptor, event: &AuditEvent) -> String {
        if !event.is_write() || !model.history || !event.history {
            return String::new();
        }

        let store = self.ctx.record_store();
        let before_at = event.date - Duration::microseconds(1);

        let before = match store.read_at(model, event.record_id, before_at).await {
            Ok(Some(record)) => record,
            Ok(None) => return String::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read record before write");
                return String::new();
            }
        };
        let after = match store.read_at(model, event.record_id, event.date).await {
            Ok(Some(record)) => record,
            Ok(None) => return String::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read record at write");
                return String::new();
            }
        };

        diff_records(model, &before, &after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use audit_core::entities::{FieldDescriptor, FieldKind, FieldValue, RecordRef, SelectionOption};

    fn task_model() -> ModelDescriptor {
        ModelDescriptor {
            name: "project.task".to_string(),
            label: "Task".to_string(),
            table: "project_task".to_string(),
            history: true,
            computed: false,
            rec_name: "name".to_string(),
            fields: vec![
                FieldDescriptor::new("id", "ID", FieldKind::Integer),
                FieldDescriptor::new("name", "Name", FieldKind::Char),
                FieldDescriptor::new(
                    "priority",
                    "Priority",
                    FieldKind::Selection {
                        options: vec![
                            SelectionOption::new("high", "High"),
                            SelectionOption::new("low", "Low"),
                        ],
                    },
                ),
                FieldDescriptor::new(
                    "party",
                    "Customer",
                    FieldKind::Many2One {
                        target: "party.party".to_string(),
                    },
                ),
                FieldDescriptor::new(
                    "tags",
                    "Tags",
                    FieldKind::Many2Many {
                        target: "project.tag".to_string(),
                        link_table: "project_task_tag".to_string(),
                        origin: "task".to_string(),
                        link_target: "tag".to_string(),
                    },
                ),
                FieldDescriptor::new("write_date", "Edited at", FieldKind::DateTime),
            ],
        }
    }

    fn record(values: Vec<(&str, FieldValue)>) -> Record {
        Record {
            model: "project.task".to_string(),
            id: 1,
            display_name: "Ship it".to_string(),
            values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_diff_lists_only_changed_fields() {
        let model = task_model();
        let before = record(vec![
            ("name", FieldValue::Text("Ship it".to_string())),
            ("priority", FieldValue::Text("high".to_string())),
        ]);
        let after = record(vec![
            ("name", FieldValue::Text("Ship it".to_string())),
            ("priority", FieldValue::Text("low".to_string())),
        ]);
        assert_eq!(diff_records(&model, &before, &after), "Priority: High → Low");
    }

    #[test]
    fn test_relation_diff_uses_display_names() {
        let model = task_model();
        let before = record(vec![(
            "party",
            FieldValue::Relation(Some(RecordRef::new("party.party", 4, "Acme"))),
        )]);
        let after = record(vec![(
            "party",
            FieldValue::Relation(Some(RecordRef::new("party.party", 9, "Globex"))),
        )]);
        assert_eq!(diff_records(&model, &before, &after), "Customer: Acme → Globex");

        let cleared = record(vec![("party", FieldValue::Relation(None))]);
        assert_eq!(diff_records(&model, &before, &cleared), "Customer: Acme → ");
    }

    #[test]
    fn test_renamed_relation_is_not_a_change() {
        let model = task_model();
        let before = record(vec![(
            "party",
            FieldValue::Relation(Some(RecordRef::new("party.party", 4, "Acme"))),
        )]);
        let after = record(vec![(
            "party",
            FieldValue::Relation(Some(RecordRef::new("party.party", 4, "Acme Corp"))),
        )]);
        assert_eq!(diff_records(&model, &before, &after), "");
    }

    #[test]
    fn test_metadata_lists_and_unresolved_fields_are_skipped() {
        let model = task_model();
        let before = record(vec![
            ("write_date", FieldValue::Null),
            ("tags", FieldValue::Relations(vec![])),
            ("name", FieldValue::Text("a".to_string())),
            ("priority", FieldValue::Text("high".to_string())),
        ]);
        let after = record(vec![
            ("write_date", FieldValue::Text("changed".to_string())),
            (
                "tags",
                FieldValue::Relations(vec![RecordRef::new("project.tag", 1, "Urgent")]),
            ),
            ("name", FieldValue::Text("b".to_string())),
        ]);
        assert_eq!(diff_records(&model, &before, &after), "Name: a → b");
    }

    #[test]
    fn test_lines_follow_field_order() {
        let model = task_model();
        let before = record(vec![
            ("priority", FieldValue::Text("high".to_string())),
            ("name", FieldValue::Text("a".to_string())),
        ]);
        let after = record(vec![
            ("priority", FieldValue::Text("low".to_string())),
            ("name", FieldValue::Text("b".to_string())),
        ]);
        assert_eq!(
            diff_records(&model, &before, &after),
            "Name: a → b\nPriority: High → Low"
        );
    }
}
