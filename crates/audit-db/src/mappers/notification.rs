//! Notification rule rows -> entity

use audit_core::entities::NotificationRule;
use audit_core::value_objects::WatchedField;

use crate::models::{NotificationRuleRow, RuleTargetRow};

/// Assemble a rule from its row and the target rows belonging to it
pub fn notification_rule(row: NotificationRuleRow, targets: &[RuleTargetRow]) -> NotificationRule {
    let mut watched: Vec<WatchedField> = targets
        .iter()
        .filter(|t| t.rule_id == row.id)
        .map(|t| WatchedField::new(t.model.clone(), t.field.clone()))
        .collect();
    watched.sort();

    NotificationRule {
        id: row.id,
        name: row.name,
        email: row.email,
        mail_server_id: row.mail_server_id,
        targets: watched,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
