//! # audit-worker
//!
//! Polls the notification mail queue and delivers due tasks.

pub mod worker;

pub use worker::{create_worker, run, BatchReport, MailWorker, MailWorkerConfig};
