//! # audit-service
//!
//! Application layer: the audit log and its change summaries, field-watch
//! notifications, mail delivery and audit log reports.

pub mod dto;
pub mod mail;
pub mod render;
pub mod report;
pub mod services;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
