//! Ports implemented by the infrastructure crates

mod repositories;

pub use repositories::{
    AuditLogRepository, MailServerRepository, ModelCatalog, NotificationRuleRepository,
    RecordStore, RepoResult, SessionStore, TaskQueue, UserDirectory,
};
