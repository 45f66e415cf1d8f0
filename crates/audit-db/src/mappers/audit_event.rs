//! Audit log row -> audit event

use audit_core::entities::{AuditEvent, EventType};
use audit_core::error::DomainError;

use crate::models::AuditEventRow;

/// Convert a union row; the change summary is filled in by the service layer
pub fn audit_event(row: AuditEventRow) -> Result<AuditEvent, DomainError> {
    let event_type: EventType = row
        .event_type
        .parse()
        .map_err(DomainError::DatabaseError)?;

    Ok(AuditEvent {
        event_type,
        user_id: row.user_id,
        date: row.date,
        model: row.model,
        record_id: row.record_id,
        revision: row.revision,
        history: row.history,
        changes: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_audit_event_mapping() {
        let row = AuditEventRow {
            event_type: "delete".to_string(),
            model: "project.task".to_string(),
            record_id: 3,
            revision: 12,
            user_id: Some(1),
            date: Utc::now(),
            history: true,
        };
        let event = audit_event(row).unwrap();
        assert_eq!(event.event_type, EventType::Delete);
        assert_eq!(event.key().to_string(), "project.task:3:delete:12");
        assert!(event.changes.is_empty());
    }

    #[test]
    fn test_bad_event_type() {
        let row = AuditEventRow {
            event_type: "purge".to_string(),
            model: "project.task".to_string(),
            record_id: 3,
            revision: 3,
            user_id: None,
            date: Utc::now(),
            history: false,
        };
        assert!(matches!(audit_event(row), Err(DomainError::DatabaseError(_))));
    }
}
