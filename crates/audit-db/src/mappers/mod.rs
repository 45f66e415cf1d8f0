//! Row to entity mappers
//!
//! - `From<Row> for Entity` for plain rows
//! - builder functions where an entity is assembled from several rows

mod audit_event;
mod mail_server;
mod model;
mod notification;
mod user;

pub use audit_event::audit_event;
pub use model::{field_kind, model_descriptor};
pub use notification::notification_rule;
