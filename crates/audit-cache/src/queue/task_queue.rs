//! Delayed task queue on Redis sorted sets.
//!
//! Each queue name maps to one sorted set scored by the task eta in
//! milliseconds. Members are `"{sequence:020}:{json}"`, so members sharing a
//! score sort by their enqueue sequence and the queue stays FIFO among tasks
//! with the same eta. A consumer owns a task once its `ZREM` returns 1.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;

use audit_core::entities::QueuedTask;
use audit_core::error::DomainError;
use audit_core::traits::{RepoResult, TaskQueue};

use crate::pool::{RedisPool, RedisPoolError, RedisResult};

/// Key prefix for queue sorted sets
const QUEUE_PREFIX: &str = "queue:";

/// Redis-backed implementation of TaskQueue
#[derive(Clone)]
pub struct RedisTaskQueue {
    pool: RedisPool,
}

impl RedisTaskQueue {
    /// Create a new task queue
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(queue: &str) -> String {
        format!("{QUEUE_PREFIX}{queue}")
    }

    fn sequence_key(queue: &str) -> String {
        format!("{QUEUE_PREFIX}{queue}:seq")
    }

    /// Encode a task as a sorted set member
    pub fn encode_member(task: &QueuedTask) -> RedisResult<String> {
        Ok(format!("{:020}:{}", task.sequence, serde_json::to_string(task)?))
    }

    /// Decode a sorted set member
    pub fn decode_member(member: &str) -> RedisResult<QueuedTask> {
        let (_, json) = member
            .split_once(':')
            .ok_or_else(|| RedisPoolError::Malformed(member.chars().take(40).collect()))?;
        Ok(serde_json::from_str(json)?)
    }

    async fn push(&self, mut task: QueuedTask) -> RedisResult<u64> {
        let mut conn = self.pool.get().await?;
        let sequence: u64 = conn.incr(Self::sequence_key(&task.queue), 1).await?;
        task.sequence = sequence;

        let member = Self::encode_member(&task)?;
        conn.zadd::<_, _, _, ()>(Self::key(&task.queue), member, task.eta.timestamp_millis())
            .await?;
        Ok(sequence)
    }

    async fn pop_due(&self, queue: &str, now: DateTime<Utc>, max: usize) -> RedisResult<Vec<QueuedTask>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let key = Self::key(queue);
        let mut conn = self.pool.get().await?;

        let count = isize::try_from(max).unwrap_or(isize::MAX);
        let members: Vec<String> = conn
            .zrangebyscore_limit(&key, "-inf", now.timestamp_millis(), 0, count)
            .await?;

        let mut tasks = Vec::with_capacity(members.len());
        for member in members {
            // Another consumer may have taken it in between
            let removed: i32 = conn.zrem(&key, &member).await?;
            if removed == 0 {
                continue;
            }
            match Self::decode_member(&member) {
                Ok(task) => tasks.push(task),
                Err(e) => tracing::warn!(queue = %queue, error = %e, "Dropping undecodable task"),
            }
        }
        Ok(tasks)
    }
}

fn queue_error(err: RedisPoolError) -> DomainError {
    DomainError::QueueError(err.to_string())
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    async fn enqueue(&self, task: QueuedTask) -> RepoResult<()> {
        let queue = task.queue.clone();
        let eta = task.eta;
        let sequence = self.push(task).await.map_err(queue_error)?;
        tracing::debug!(queue = %queue, sequence, %eta, "Task enqueued");
        Ok(())
    }

    async fn dequeue_due(
        &self,
        queue: &str,
        now: DateTime<Utc>,
        max: usize,
    ) -> RepoResult<Vec<QueuedTask>> {
        self.pop_due(queue, now, max).await.map_err(queue_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_member_encoding() {
        let mut task = QueuedTask::new("notification_mail", json!({"rule_id": 4}), Utc::now());
        task.sequence = 42;

        let member = RedisTaskQueue::encode_member(&task).unwrap();
        assert!(member.starts_with("00000000000000000042:{"));

        let decoded = RedisTaskQueue::decode_member(&member).unwrap();
        assert_eq!(decoded, task);
    }

    #[test]
    fn test_members_sort_by_sequence() {
        let eta = Utc::now();
        let mut first = QueuedTask::new("q", json!({"z": 1}), eta);
        first.sequence = 9;
        let mut second = QueuedTask::new("q", json!({"a": 1}), eta);
        second.sequence = 10;

        let a = RedisTaskQueue::encode_member(&first).unwrap();
        let b = RedisTaskQueue::encode_member(&second).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(RedisTaskQueue::decode_member("no-separator").is_err());
        assert!(RedisTaskQueue::decode_member("1:not json").is_err());
    }

    #[test]
    fn test_keys() {
        assert_eq!(RedisTaskQueue::key("notification_mail"), "queue:notification_mail");
        assert_eq!(
            RedisTaskQueue::sequence_key("notification_mail"),
            "queue:notification_mail:seq"
        );
    }
}
