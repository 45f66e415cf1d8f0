//! Repository implementations
//!
//! PostgreSQL implementations of the ports defined in audit-core.

mod audit_log;
mod catalog;
mod error;
mod mail_server;
mod notification_rule;
mod record_store;
mod user;

pub use audit_log::PgAuditLogRepository;
pub use catalog::PgModelCatalog;
pub use mail_server::PgMailServerRepository;
pub use notification_rule::PgNotificationRuleRepository;
pub use record_store::PgRecordStore;
pub use user::PgUserDirectory;
