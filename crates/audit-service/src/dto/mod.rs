//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs

pub mod requests;
pub mod responses;

// Re-export commonly used request types
pub use requests::{
    AuditLogParams, CreateRecordsRequest, CreateRuleRequest, DeleteRecordsRequest,
    PrintWizardRequest, ReportParams, UpdateRuleRequest, WriteRecordsRequest, MAX_AUDIT_LOG_LIMIT,
};

// Re-export commonly used response types
pub use responses::{
    ApiResponse, AuditLogEntry, CreatedRecordsResponse, FieldResponse, HealthChecks,
    HealthResponse, MailServerResponse, ModelResponse, ModifiedRecordsResponse, ReadinessResponse,
    RecordResponse, RuleResponse, WizardResponse,
};
