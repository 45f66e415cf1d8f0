//! Notification field cache

mod field_cache;

pub use field_cache::{NotificationFieldCache, WatchSnapshot};
