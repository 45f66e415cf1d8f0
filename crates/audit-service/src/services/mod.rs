//! Business logic services
//!
//! This module contains the audit log, change diffs, field watching,
//! notification delivery and the report wizard.

pub mod audit_log;
pub mod catalog;
pub mod changes;
pub mod context;
pub mod error;
pub mod mail_server;
pub mod notification;
pub mod records;
pub mod rules;
pub mod watch;
pub mod wizard;

// Re-export all services for convenience
pub use audit_log::AuditLogService;
pub use catalog::CatalogService;
pub use changes::{diff_records, ChangeService};
pub use context::{ServiceContext, ServiceContextBuilder, ServiceSettings, DEFAULT_NOTIFICATION_QUEUE};
pub use error::{ServiceError, ServiceResult};
pub use mail_server::MailServerService;
pub use notification::{DeliveryOutcome, NotificationService};
pub use records::RecordService;
pub use rules::RuleService;
pub use watch::{FieldWatchInterceptor, Intercepted, EXCLUDED_MODEL_PREFIXES};
pub use wizard::{WizardService, WizardSession, WizardState};
