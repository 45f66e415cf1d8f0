//! Notification rule database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the notification_rule table
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRuleRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mail_server_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the notification_rule_field table
#[derive(Debug, Clone, FromRow)]
pub struct RuleTargetRow {
    pub rule_id: i64,
    pub model: String,
    pub field: String,
}
