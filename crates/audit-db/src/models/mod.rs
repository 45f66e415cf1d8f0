//! Database models - SQLx-compatible structs for PostgreSQL rows

mod audit_event;
mod ir_model;
mod mail_server;
mod notification;
mod user;

pub use audit_event::AuditEventRow;
pub use ir_model::{IrModelFieldRow, IrModelRow};
pub use mail_server::MailServerRow;
pub use notification::{NotificationRuleRow, RuleTargetRow};
pub use user::UserRow;
