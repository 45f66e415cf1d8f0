//! Conversions between JSON and column values
//!
//! Rows are read with `row_to_json`, so decoding works from the JSON encoding
//! PostgreSQL produces for each column type. Incoming values are JSON too and
//! are encoded to typed bind values after checking them against the field kind.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use audit_core::entities::{FieldDescriptor, FieldKind, FieldValue};
use audit_core::error::DomainError;

use crate::query::BindValue;

/// Parse a `"model,id"` reference
pub fn parse_reference(raw: &str) -> Option<(&str, i64)> {
    let (model, id) = raw.rsplit_once(',')?;
    let id = id.trim().parse().ok()?;
    let model = model.trim();
    if model.is_empty() {
        return None;
    }
    Some((model, id))
}

/// Parse a timestamp as produced by `row_to_json` or sent by clients
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // timestamptz encodes short offsets such as +00
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Decode a non-relational column value
///
/// Returns `None` when the stored JSON does not match the declared kind.
pub fn decode_scalar(kind: &FieldKind, raw: &Value) -> Option<FieldValue> {
    if raw.is_null() {
        return Some(FieldValue::Null);
    }

    match kind {
        FieldKind::Char | FieldKind::Text | FieldKind::Selection { .. } => {
            raw.as_str().map(|s| FieldValue::Text(s.to_string()))
        }
        FieldKind::Integer => raw.as_i64().map(FieldValue::Integer),
        FieldKind::Float => raw.as_f64().map(FieldValue::Float),
        FieldKind::Numeric => match raw {
            Value::Number(n) => Some(FieldValue::Numeric(n.to_string())),
            Value::String(s) => Some(FieldValue::Numeric(s.clone())),
            _ => None,
        },
        FieldKind::Boolean => raw.as_bool().map(FieldValue::Boolean),
        FieldKind::Date => raw
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(FieldValue::Date),
        FieldKind::DateTime => raw.as_str().and_then(parse_datetime).map(FieldValue::DateTime),
        FieldKind::Many2One { .. }
        | FieldKind::Reference
        | FieldKind::One2Many { .. }
        | FieldKind::Many2Many { .. } => None,
    }
}

/// Text used as a display name for a rec_name column value
pub fn display_text(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn invalid(field: &FieldDescriptor, reason: impl Into<String>) -> DomainError {
    DomainError::InvalidFieldValue {
        field: field.name.clone(),
        reason: reason.into(),
    }
}

/// Encode an incoming value of a column field
pub fn encode_value(field: &FieldDescriptor, raw: &Value) -> Result<BindValue, DomainError> {
    let null = raw.is_null();

    let value = match &field.kind {
        FieldKind::Char | FieldKind::Text => {
            if null {
                BindValue::Text(None)
            } else {
                let s = raw.as_str().ok_or_else(|| invalid(field, "expected a string"))?;
                BindValue::Text(Some(s.to_string()))
            }
        }
        FieldKind::Selection { options } => {
            if null {
                BindValue::Text(None)
            } else {
                let s = raw.as_str().ok_or_else(|| invalid(field, "expected a string"))?;
                if !options.is_empty() && !options.iter().any(|o| o.value == s) {
                    return Err(invalid(field, format!("'{s}' is not a valid option")));
                }
                BindValue::Text(Some(s.to_string()))
            }
        }
        FieldKind::Integer => {
            if null {
                BindValue::BigInt(None)
            } else {
                BindValue::BigInt(Some(
                    raw.as_i64().ok_or_else(|| invalid(field, "expected an integer"))?,
                ))
            }
        }
        FieldKind::Float => {
            if null {
                BindValue::Double(None)
            } else {
                BindValue::Double(Some(
                    raw.as_f64().ok_or_else(|| invalid(field, "expected a number"))?,
                ))
            }
        }
        FieldKind::Numeric => match raw {
            Value::Null => BindValue::Numeric(None),
            Value::Number(n) => BindValue::Numeric(Some(n.to_string())),
            Value::String(s) if s.trim().parse::<f64>().is_ok() => {
                BindValue::Numeric(Some(s.trim().to_string()))
            }
            _ => return Err(invalid(field, "expected a decimal number")),
        },
        FieldKind::Boolean => {
            if null {
                BindValue::Bool(None)
            } else {
                BindValue::Bool(Some(
                    raw.as_bool().ok_or_else(|| invalid(field, "expected a boolean"))?,
                ))
            }
        }
        FieldKind::Date => {
            if null {
                BindValue::Date(None)
            } else {
                let date = raw
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                    .ok_or_else(|| invalid(field, "expected a YYYY-MM-DD date"))?;
                BindValue::Date(Some(date))
            }
        }
        FieldKind::DateTime => {
            if null {
                BindValue::Timestamp(None)
            } else {
                let dt = raw
                    .as_str()
                    .and_then(parse_datetime)
                    .ok_or_else(|| invalid(field, "expected an RFC 3339 timestamp"))?;
                BindValue::Timestamp(Some(dt))
            }
        }
        FieldKind::Many2One { .. } => {
            if null {
                BindValue::BigInt(None)
            } else {
                BindValue::BigInt(Some(
                    raw.as_i64().ok_or_else(|| invalid(field, "expected a record id"))?,
                ))
            }
        }
        FieldKind::Reference => {
            if null {
                BindValue::Text(None)
            } else {
                let s = raw
                    .as_str()
                    .filter(|s| parse_reference(s).is_some())
                    .ok_or_else(|| invalid(field, "expected \"model,id\""))?;
                BindValue::Text(Some(s.to_string()))
            }
        }
        FieldKind::One2Many { .. } | FieldKind::Many2Many { .. } => {
            return Err(invalid(field, "list fields are not stored as columns"));
        }
    };

    Ok(value)
}

/// Decode the id list given for a many2many field
pub fn encode_ids(field: &FieldDescriptor, raw: &Value) -> Result<Vec<i64>, DomainError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_i64().ok_or_else(|| invalid(field, "expected a list of record ids")))
            .collect(),
        _ => Err(invalid(field, "expected a list of record ids")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_core::entities::SelectionOption;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_reference("party.party,12"), Some(("party.party", 12)));
        assert_eq!(parse_reference("party.party,"), None);
        assert_eq!(parse_reference(",12"), None);
        assert_eq!(parse_reference("nothing"), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let dt = parse_datetime("2024-05-01T10:00:00.123456+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.nanosecond(), 123_456_000);

        let dt = parse_datetime("2024-05-01T10:00:00+00").unwrap();
        assert_eq!(dt.hour(), 10);

        let dt = parse_datetime("2024-05-01T10:00:00.5").unwrap();
        assert_eq!(dt.day(), 1);

        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_decode_scalar() {
        assert_eq!(
            decode_scalar(&FieldKind::Numeric, &json!(12.5)),
            Some(FieldValue::Numeric("12.5".to_string()))
        );
        assert_eq!(
            decode_scalar(&FieldKind::Date, &json!("2024-02-29")),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(decode_scalar(&FieldKind::Integer, &json!(null)), Some(FieldValue::Null));
        assert_eq!(decode_scalar(&FieldKind::Integer, &json!("x")), None);
    }

    #[test]
    fn test_encode_selection() {
        let field = FieldDescriptor::new(
            "priority",
            "Priority",
            FieldKind::Selection {
                options: vec![
                    SelectionOption::new("high", "High"),
                    SelectionOption::new("low", "Low"),
                ],
            },
        );
        assert_eq!(
            encode_value(&field, &json!("low")).unwrap(),
            BindValue::Text(Some("low".to_string()))
        );
        assert!(matches!(
            encode_value(&field, &json!("urgent")),
            Err(DomainError::InvalidFieldValue { .. })
        ));
        assert_eq!(encode_value(&field, &json!(null)).unwrap(), BindValue::Text(None));
    }

    #[test]
    fn test_encode_type_mismatch() {
        let field = FieldDescriptor::new("qty", "Quantity", FieldKind::Integer);
        assert!(encode_value(&field, &json!("3")).is_err());

        let field = FieldDescriptor::new("amount", "Amount", FieldKind::Numeric);
        assert_eq!(
            encode_value(&field, &json!("10.20")).unwrap(),
            BindValue::Numeric(Some("10.20".to_string()))
        );
        assert!(encode_value(&field, &json!("ten")).is_err());
    }

    #[test]
    fn test_encode_ids() {
        let field = FieldDescriptor::new(
            "tags",
            "Tags",
            FieldKind::Many2Many {
                target: "project.tag".to_string(),
                link_table: "project_task_tag".to_string(),
                origin: "task".to_string(),
                link_target: "tag".to_string(),
            },
        );
        assert_eq!(encode_ids(&field, &json!([1, 2])).unwrap(), vec![1, 2]);
        assert!(encode_ids(&field, &json!(["a"])).is_err());
        assert!(encode_value(&field, &json!([1])).is_err());
    }

    #[test]
    fn test_display_text() {
        assert_eq!(display_text(Some(&json!("Acme"))), Some("Acme".to_string()));
        assert_eq!(display_text(Some(&json!(""))), None);
        assert_eq!(display_text(Some(&json!(7))), Some("7".to_string()));
        assert_eq!(display_text(None), None);
    }
}
