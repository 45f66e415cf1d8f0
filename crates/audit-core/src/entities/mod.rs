//! Domain entities - core business objects

mod audit_event;
mod mail_server;
mod model;
mod notification;
mod record;
mod user;

pub use audit_event::{AuditEvent, AuditLogQuery, EventType};
pub use mail_server::{MailServer, MailTls, NewMailServer};
pub use model::{FieldDescriptor, FieldKind, ModelDescriptor, SelectionOption, AUDIT_METADATA_FIELDS};
pub use notification::{NewNotificationRule, NotificationRule, NotificationTask, QueuedTask, StagedChange};
pub use record::{FieldValue, Record, RecordRef, Values};
pub use user::User;
