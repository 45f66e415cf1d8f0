//! # audit-cache
//!
//! Redis-backed task queue and wizard sessions, and the in-process
//! notification field cache.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Task Queue**: Delayed, FIFO-per-queue background tasks
//! - **Sessions**: Report wizard state with expiry
//! - **Field Cache**: `(model, field)` to rule index, rebuilt on demand
//!
//! ## Example
//!
//! ```ignore
//! use audit_cache::{RedisPool, RedisPoolConfig, RedisTaskQueue};
//! use audit_core::{QueuedTask, TaskQueue};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let queue = RedisTaskQueue::new(pool.clone());
//! queue.enqueue(QueuedTask::new("notification_mail", payload, eta)).await?;
//! let due = queue.dequeue_due("notification_mail", Utc::now(), 20).await?;
//! ```

pub mod notification;
pub mod pool;
pub mod queue;
pub mod session;

// Re-export pool types
pub use pool::{
    create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool,
};

pub use notification::{NotificationFieldCache, WatchSnapshot};
pub use queue::RedisTaskQueue;
pub use session::WizardSessionStore;
