//! Background task queue

mod task_queue;

pub use task_queue::RedisTaskQueue;
