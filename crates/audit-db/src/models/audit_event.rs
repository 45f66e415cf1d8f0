//! Audit log row - one row of the unioned per-model subqueries

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Row produced by the audit log union query
#[derive(Debug, Clone, FromRow)]
pub struct AuditEventRow {
    pub event_type: String,
    pub model: String,
    pub record_id: i64,
    pub revision: i64,
    pub user_id: Option<i64>,
    pub date: DateTime<Utc>,
    pub history: bool,
}
