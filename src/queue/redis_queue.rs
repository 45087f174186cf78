use async_trait::async_trait;
use redis::aio::ConnectionManager as RedisConnectionManager;
use redis::AsyncCommands;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::queue::{QueuedTask, TaskQueue, TaskStatus};

/// Redis keys structure:
/// - dayspick:tasks:ready      - List of task ids ready to run (FIFO)
/// - dayspick:tasks:scheduled  - Sorted set of delayed task ids, scored by run_at
/// - dayspick:tasks:{id}       - String for task data (JSON)
const READY_KEY: &str = "dayspick:tasks:ready";
const SCHEDULED_KEY: &str = "dayspick:tasks:scheduled";
const TASK_PREFIX: &str = "dayspick:tasks:";

fn redis_err(e: redis::RedisError) -> AppError {
    AppError::Queue(format!("Redis error: {}", e))
}

/// Redis-backed task queue implementation
#[derive(Clone)]
pub struct RedisQueue {
    conn: RedisConnectionManager,
}

impl RedisQueue {
    pub fn new(conn: RedisConnectionManager) -> Self {
        Self { conn }
    }

    fn task_key(id: Uuid) -> String {
        format!("{}{}", TASK_PREFIX, id)
    }

    async fn save_task(&self, task: &QueuedTask) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let task_json = serde_json::to_string(task)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;

        let _: () = conn
            .set(Self::task_key(task.id), &task_json)
            .await
            .map_err(redis_err)?;

        Ok(())
    }

    async fn load_task(&self, task_id: Uuid) -> AppResult<QueuedTask> {
        self.get_task(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task".to_string()))
    }

    /// Move due scheduled ids onto the ready list.
    ///
    /// `ZREM` decides the winner when several workers promote at once.
    async fn promote_due(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let due: Vec<String> = conn
            .zrangebyscore(SCHEDULED_KEY, "-inf", now)
            .await
            .map_err(redis_err)?;

        for task_id in due {
            let removed: i64 = conn.zrem(SCHEDULED_KEY, &task_id).await.map_err(redis_err)?;
            if removed == 1 {
                let _: () = conn.rpush(READY_KEY, &task_id).await.map_err(redis_err)?;
                tracing::debug!(task_id = %task_id, "Scheduled task promoted");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl TaskQueue for RedisQueue {
    async fn enqueue(&self, task: QueuedTask) -> AppResult<Uuid> {
        let mut conn = self.conn.clone();
        let task_id = task.id;

        self.save_task(&task).await?;

        if task.is_due(OffsetDateTime::now_utc()) {
            let _: () = conn
                .rpush(READY_KEY, task_id.to_string())
                .await
                .map_err(redis_err)?;
        } else {
            let _: () = conn
                .zadd(SCHEDULED_KEY, task_id.to_string(), task.run_at.unix_timestamp())
                .await
                .map_err(redis_err)?;
        }

        tracing::info!(task_id = %task_id, kind = task.kind.as_str(), "Task enqueued");

        Ok(task_id)
    }

    async fn dequeue(&self, timeout_seconds: u64) -> AppResult<Option<QueuedTask>> {
        self.promote_due().await?;

        let mut conn = self.conn.clone();
        let result: Option<(String, String)> = conn
            .blpop(READY_KEY, timeout_seconds as f64)
            .await
            .map_err(redis_err)?;

        let Some((_, task_id_str)) = result else {
            return Ok(None);
        };
        let task_id = Uuid::parse_str(&task_id_str)
            .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?;

        match self.get_task(task_id).await? {
            Some(mut task) => {
                task.status = TaskStatus::Running;
                task.started_at = Some(OffsetDateTime::now_utc());
                self.save_task(&task).await?;

                tracing::info!(task_id = %task_id, kind = task.kind.as_str(), "Task dequeued");
                Ok(Some(task))
            }
            None => {
                tracing::warn!(task_id = %task_id, "Dequeued id without task data");
                Ok(None)
            }
        }
    }

    async fn get_task(&self, task_id: Uuid) -> AppResult<Option<QueuedTask>> {
        let mut conn = self.conn.clone();

        let task_json: Option<String> = conn
            .get(Self::task_key(task_id))
            .await
            .map_err(redis_err)?;

        task_json
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| AppError::Internal(format!("Deserialization error: {}", e)))
            })
            .transpose()
    }

    async fn complete_task(&self, task_id: Uuid) -> AppResult<()> {
        let mut task = self.load_task(task_id).await?;

        task.status = TaskStatus::Completed;
        task.completed_at = Some(OffsetDateTime::now_utc());
        self.save_task(&task).await?;

        tracing::info!(task_id = %task_id, "Task completed");

        Ok(())
    }

    async fn fail_task(&self, task_id: Uuid, error: String, retryable: bool) -> AppResult<()> {
        let mut task = self.load_task(task_id).await?;

        task.error_message = Some(error.clone());

        let new_status = if retryable && task.retry_count < task.max_retries {
            task.retry_count += 1;
            TaskStatus::Failed
        } else {
            task.completed_at = Some(OffsetDateTime::now_utc());
            TaskStatus::Dead
        };

        task.status = new_status;
        self.save_task(&task).await?;

        tracing::warn!(
            task_id = %task_id,
            status = new_status.as_str(),
            retry_count = task.retry_count,
            error = %error,
            "Task failed"
        );

        Ok(())
    }

    async fn requeue(&self, task_id: Uuid) -> AppResult<()> {
        let mut task = self.load_task(task_id).await?;

        if task.status != TaskStatus::Failed {
            return Err(AppError::Validation(
                "Only failed tasks can be requeued".to_string(),
            ));
        }

        task.status = TaskStatus::Pending;
        task.started_at = None;
        self.save_task(&task).await?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .rpush(READY_KEY, task_id.to_string())
            .await
            .map_err(redis_err)?;

        tracing::info!(task_id = %task_id, retry_count = task.retry_count, "Task requeued");

        Ok(())
    }

    async fn queue_length(&self) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        conn.llen(READY_KEY).await.map_err(redis_err)
    }

    async fn scheduled_length(&self) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        conn.zcard(SCHEDULED_KEY).await.map_err(redis_err)
    }
}
