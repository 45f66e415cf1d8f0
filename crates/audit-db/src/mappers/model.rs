//! Registry rows -> model descriptors

use audit_core::entities::{FieldDescriptor, FieldKind, ModelDescriptor, SelectionOption};

use crate::models::{IrModelFieldRow, IrModelRow};

/// Decode the `[[value, label], ...]` selection column
fn selection_options(raw: Option<&serde_json::Value>) -> Vec<SelectionOption> {
    let Some(serde_json::Value::Array(items)) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::Array(pair) if pair.len() == 2 => {
                let value = pair[0].as_str()?;
                let label = pair[1].as_str().unwrap_or(value);
                Some(SelectionOption::new(value, label))
            }
            _ => None,
        })
        .collect()
}

/// Map a field row to its kind
///
/// Returns `None` for unknown type tags and for relational fields whose
/// registry entry is incomplete.
pub fn field_kind(row: &IrModelFieldRow) -> Option<FieldKind> {
    let kind = match row.ttype.as_str() {
        "char" => FieldKind::Char,
        "text" => FieldKind::Text,
        "integer" => FieldKind::Integer,
        "float" => FieldKind::Float,
        "numeric" => FieldKind::Numeric,
        "boolean" => FieldKind::Boolean,
        "date" => FieldKind::Date,
        "datetime" => FieldKind::DateTime,
        "selection" => FieldKind::Selection {
            options: selection_options(row.selection.as_ref()),
        },
        "many2one" => FieldKind::Many2One {
            target: row.relation.clone()?,
        },
        "reference" => FieldKind::Reference,
        "one2many" => FieldKind::One2Many {
            target: row.relation.clone()?,
            inverse: row.relation_field.clone()?,
        },
        "many2many" => FieldKind::Many2Many {
            target: row.relation.clone()?,
            link_table: row.relation_table.clone()?,
            origin: row.relation_origin.clone()?,
            link_target: row.relation_target.clone()?,
        },
        _ => return None,
    };
    Some(kind)
}

/// Build a model descriptor from its row and its field rows (already ordered)
pub fn model_descriptor(row: IrModelRow, fields: Vec<IrModelFieldRow>) -> ModelDescriptor {
    let fields = fields
        .into_iter()
        .filter_map(|f| match field_kind(&f) {
            Some(kind) => Some(FieldDescriptor::new(f.name, f.label, kind)),
            None => {
                tracing::debug!(model = %row.model, field = %f.name, ttype = %f.ttype, "Skipping field with unsupported definition");
                None
            }
        })
        .collect();

    ModelDescriptor {
        name: row.model,
        label: row.name,
        table: row.table_name.unwrap_or_default(),
        history: row.history,
        computed: row.computed,
        rec_name: row.rec_name,
        fields,
    }
}
