//! Per-kind value formatting
//!
//! Diffs, notification mails and reports all show field values through
//! `display_value`, so the same record reads the same everywhere.

use chrono::{DateTime, FixedOffset, Utc};

use audit_core::entities::{FieldKind, FieldValue};

/// Timestamp layout used in reports and mails
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a field value for humans
///
/// Relations render as display names (empty when unset), list relations as
/// comma separated display names, selections as their option label.
pub fn display_value(kind: &FieldKind, value: &FieldValue) -> String {
    match value {
        FieldValue::Null | FieldValue::Relation(None) => String::new(),
        FieldValue::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Numeric(n) => n.clone(),
        FieldValue::Text(s) => match kind {
            FieldKind::Selection { .. } => kind.selection_label(s).unwrap_or(s).to_string(),
            _ => s.clone(),
        },
        FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        FieldValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        FieldValue::Relation(Some(r)) => r.display_name.clone(),
        FieldValue::Relations(refs) => refs
            .iter()
            .map(|r| r.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Seconds-precision timestamp in the given offset
pub fn format_timestamp(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset).format(DATETIME_FORMAT).to_string()
}

/// Minimal HTML escaping for text nodes and attribute values
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
