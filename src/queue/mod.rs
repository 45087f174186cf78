pub mod memory_queue;
pub mod redis_queue;
pub mod task;

pub use memory_queue::InMemoryQueue;
pub use redis_queue::RedisQueue;
pub use task::{QueuedTask, TaskKind, TaskStatus};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;

/// Task queue trait for abstracting queue backends
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Push a task; it becomes visible to workers at its `run_at`
    async fn enqueue(&self, task: QueuedTask) -> AppResult<Uuid>;

    /// Pop the next due task, waiting up to `timeout_seconds`
    async fn dequeue(&self, timeout_seconds: u64) -> AppResult<Option<QueuedTask>>;

    async fn get_task(&self, task_id: Uuid) -> AppResult<Option<QueuedTask>>;

    async fn complete_task(&self, task_id: Uuid) -> AppResult<()>;

    /// Mark task as failed; it is retried while attempts remain and `retryable` holds
    async fn fail_task(&self, task_id: Uuid, error: String, retryable: bool) -> AppResult<()>;

    /// Put a failed task back on the queue
    async fn requeue(&self, task_id: Uuid) -> AppResult<()>;

    /// Number of tasks ready to run
    async fn queue_length(&self) -> AppResult<u64>;

    /// Number of tasks waiting for their `run_at`
    async fn scheduled_length(&self) -> AppResult<u64>;
}
