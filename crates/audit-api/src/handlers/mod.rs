//! Route handlers
//!
//! All HTTP request handlers organized by resource.

pub mod audit_log;
pub mod health;
pub mod mail_servers;
pub mod models;
pub mod records;
pub mod rules;
pub mod wizard;
