//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use audit_core::entities::{
    AuditLogQuery, EventType, FieldValue, MailServer, MailTls, ModelDescriptor, NotificationRule,
    Record,
};
use audit_core::value_objects::{EventKey, WatchedField};

use crate::services::wizard::{WizardSession, WizardState};

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Model Responses
// ============================================================================

/// Field of a registered model
#[derive(Debug, Clone, Serialize)]
pub struct FieldResponse {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Registered model, as offered in model selections
#[derive(Debug, Clone, Serialize)]
pub struct ModelResponse {
    pub name: String,
    pub label: String,
    pub history: bool,
    pub fields: Vec<FieldResponse>,
}

impl From<&ModelDescriptor> for ModelResponse {
    fn from(model: &ModelDescriptor) -> Self {
        Self {
            name: model.name.clone(),
            label: model.label.clone(),
            history: model.history,
            fields: model
                .fields
                .iter()
                .map(|f| FieldResponse {
                    name: f.name.clone(),
                    label: f.label.clone(),
                    kind: f.kind.tag(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Audit Log Responses
// ============================================================================

/// One row of the audit log, resolved for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub key: EventKey,
    pub event_type: EventType,
    pub event_label: String,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub date: DateTime<Utc>,
    /// Seconds precision, company offset
    pub date_display: String,
    pub model: String,
    pub model_label: String,
    pub record_id: i64,
    pub record_name: String,
    pub history: bool,
    pub changes: String,
}

// ============================================================================
// Notification Rule Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RuleResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mail_server_id: Option<i64>,
    pub targets: Vec<WatchedField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NotificationRule> for RuleResponse {
    fn from(rule: NotificationRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            email: rule.email,
            mail_server_id: rule.mail_server_id,
            targets: rule.targets,
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

// ============================================================================
// Mail Server Responses
// ============================================================================

/// Mail server without its credentials
#[derive(Debug, Clone, Serialize)]
pub struct MailServerResponse {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub tls: MailTls,
}

impl From<MailServer> for MailServerResponse {
    fn from(server: MailServer) -> Self {
        Self {
            id: server.id,
            name: server.name,
            host: server.host,
            port: server.port,
            from_address: server.from_address,
            username: server.username,
            tls: server.tls,
        }
    }
}

// ============================================================================
// Record Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RecordResponse {
    pub model: String,
    pub id: i64,
    pub display_name: String,
    pub values: BTreeMap<String, FieldValue>,
}

impl From<Record> for RecordResponse {
    fn from(record: Record) -> Self {
        Self {
            model: record.model,
            id: record.id,
            display_name: record.display_name,
            values: record.values,
        }
    }
}

/// Result of a create through the record endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CreatedRecordsResponse {
    pub ids: Vec<i64>,
    pub notifications_enqueued: usize,
}

/// Result of a write or delete through the record endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ModifiedRecordsResponse {
    pub count: usize,
    pub notifications_enqueued: usize,
}

// ============================================================================
// Wizard Responses
// ============================================================================

/// Report wizard session as shown to the client
#[derive(Debug, Clone, Serialize)]
pub struct WizardResponse {
    pub id: String,
    pub state: WizardState,
    pub params: AuditLogQuery,
    /// Present in `open_` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<AuditLogEntry>>,
    pub created_at: DateTime<Utc>,
}

impl From<WizardSession> for WizardResponse {
    fn from(session: WizardSession) -> Self {
        Self {
            id: session.id,
            state: session.state,
            params: session.params,
            results: session.results,
            created_at: session.created_at,
        }
    }
}

// ============================================================================
// Health Check Responses
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each backing service
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub redis: String,
}

fn health_label(healthy: bool) -> String {
    if healthy { "healthy" } else { "unhealthy" }.to_string()
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool, redis_healthy: bool) -> Self {
        let all_healthy = database_healthy && redis_healthy;
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: health_label(database_healthy),
                redis: health_label(redis_healthy),
            },
        }
    }
}
