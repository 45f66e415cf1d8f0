//! Integration test utilities for the audit server
//!
//! This crate provides helpers for running end-to-end tests against
//! the REST API and the notification worker.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
