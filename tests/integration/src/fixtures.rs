//! Test fixtures and data generators
//!
//! Registers a historized `test.note` model and provides request and
//! response shapes for the API.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Registered name of the test model
pub const NOTE_MODEL: &str = "test.note";

const NOTE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS test_note (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL DEFAULT '',
    priority    TEXT,
    state       TEXT,
    create_date TIMESTAMPTZ,
    create_uid  BIGINT,
    write_date  TIMESTAMPTZ,
    write_uid   BIGINT
);

CREATE TABLE IF NOT EXISTS test_note__history (
    __id        BIGSERIAL PRIMARY KEY,
    id          BIGINT,
    name        TEXT,
    priority    TEXT,
    state       TEXT,
    create_date TIMESTAMPTZ,
    create_uid  BIGINT,
    write_date  TIMESTAMPTZ,
    write_uid   BIGINT
);

INSERT INTO ir_model (model, name, table_name, history, computed, rec_name)
VALUES ('test.note', 'Note', 'test_note', TRUE, FALSE, 'name')
ON CONFLICT (model) DO NOTHING;

INSERT INTO ir_model_field (model_id, name, label, ttype, selection, sequence)
SELECT m.id, f.name, f.label, f.ttype, f.selection::jsonb, f.sequence
FROM ir_model m
CROSS JOIN (VALUES
    ('name', 'Name', 'char', NULL, 10),
    ('priority', 'Priority', 'char', NULL, 20),
    ('state', 'State', 'selection', '[["open", "Open"], ["done", "Done"]]', 30)
) AS f(name, label, ttype, selection, sequence)
WHERE m.model = 'test.note'
ON CONFLICT (model_id, name) DO NOTHING;
"#;

/// Create and register the `test.note` model
pub async fn ensure_note_model(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(NOTE_SCHEMA).execute(pool).await?;
    Ok(())
}

/// Values of one new note
pub fn note(name: &str, priority: &str) -> Value {
    json!({ "name": name, "priority": priority, "state": "open" })
}

/// Unique note name
pub fn unique_note_name() -> String {
    format!("Note {}", unique_suffix())
}

/// Create records request
#[derive(Debug, Serialize)]
pub struct CreateRecordsRequest {
    pub rows: Vec<Value>,
}

/// Write records request
#[derive(Debug, Serialize)]
pub struct WriteRecordsRequest {
    pub ids: Vec<i64>,
    pub values: Value,
}

/// Delete records request
#[derive(Debug, Serialize)]
pub struct DeleteRecordsRequest {
    pub ids: Vec<i64>,
}

/// Created records response
#[derive(Debug, Deserialize)]
pub struct CreatedRecordsResponse {
    pub ids: Vec<i64>,
    pub notifications_enqueued: usize,
}

/// Modified records response
#[derive(Debug, Deserialize)]
pub struct ModifiedRecordsResponse {
    pub count: usize,
    pub notifications_enqueued: usize,
}

/// Record response
#[derive(Debug, Deserialize)]
pub struct RecordResponse {
    pub model: String,
    pub id: i64,
    pub display_name: String,
    pub values: Value,
}

/// Watched field of a rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedField {
    pub model: String,
    pub field: String,
}

impl WatchedField {
    pub fn note(field: &str) -> Self {
        Self {
            model: NOTE_MODEL.to_string(),
            field: field.to_string(),
        }
    }
}

/// Create rule request
#[derive(Debug, Serialize)]
pub struct CreateRuleRequest {
    pub name: String,
    pub email: String,
    pub mail_server_id: Option<i64>,
    pub targets: Vec<WatchedField>,
}

impl CreateRuleRequest {
    pub fn watching(fields: &[&str]) -> Self {
        let suffix = unique_suffix();
        Self {
            name: format!("Rule {suffix}"),
            email: format!("ops{suffix}@example.com"),
            mail_server_id: None,
            targets: fields.iter().map(|f| WatchedField::note(f)).collect(),
        }
    }
}

/// Rule response
#[derive(Debug, Deserialize)]
pub struct RuleResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mail_server_id: Option<i64>,
    pub targets: Vec<WatchedField>,
}

/// Create mail server request
#[derive(Debug, Serialize)]
pub struct CreateMailServerRequest {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub tls: String,
}

impl CreateMailServerRequest {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            name: format!("Relay {suffix}"),
            host: "smtp.example.com".to_string(),
            port: 587,
            from_address: format!("noreply{suffix}@example.com"),
            tls: "starttls".to_string(),
        }
    }
}

/// Mail server response
#[derive(Debug, Deserialize)]
pub struct MailServerResponse {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// Audit log entry
#[derive(Debug, Deserialize)]
pub struct AuditLogEntry {
    pub key: String,
    pub event_type: String,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub date: String,
    pub model: String,
    pub record_id: i64,
    pub record_name: String,
    pub history: bool,
    pub changes: String,
}

/// Wizard session response
#[derive(Debug, Deserialize)]
pub struct WizardResponse {
    pub id: String,
    pub state: String,
    pub results: Option<Vec<AuditLogEntry>>,
}

/// List envelope
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Error response
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
