use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::queue::{QueuedTask, TaskQueue, TaskStatus};

/// In-memory queue for tests
#[derive(Clone)]
pub struct InMemoryQueue {
    inner: Arc<Mutex<InMemoryQueueInner>>,
    notify: Arc<Notify>,
}

struct InMemoryQueueInner {
    ready: VecDeque<Uuid>,
    /// Tasks whose `run_at` is still in the future
    scheduled: Vec<Uuid>,
    tasks: HashMap<Uuid, QueuedTask>,
}

impl InMemoryQueueInner {
    /// Move due scheduled tasks onto the ready queue, earliest first
    fn promote_due(&mut self, now: OffsetDateTime) {
        let tasks = &self.tasks;
        let (mut due, waiting): (Vec<Uuid>, Vec<Uuid>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|id| tasks.get(id).is_none_or(|t| t.is_due(now)));

        due.sort_by_key(|id| tasks.get(id).map(|t| t.run_at));
        self.scheduled = waiting;
        self.ready.extend(due);
    }

    fn take_next(&mut self) -> Option<QueuedTask> {
        self.promote_due(OffsetDateTime::now_utc());

        while let Some(task_id) = self.ready.pop_front() {
            if let Some(task) = self.tasks.get_mut(&task_id) {
                task.status = TaskStatus::Running;
                task.started_at = Some(OffsetDateTime::now_utc());
                return Some(task.clone());
            }
        }
        None
    }

    /// Time until the earliest scheduled task becomes due
    fn next_due_in(&self, now: OffsetDateTime) -> Option<std::time::Duration> {
        self.scheduled
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|t| t.run_at - now)
            .min()
            .map(|d| std::time::Duration::try_from(d).unwrap_or_default())
    }

    fn task_mut(&mut self, task_id: Uuid) -> AppResult<&mut QueuedTask> {
        self.tasks
            .get_mut(&task_id)
            .ok_or_else(|| AppError::NotFound("Task".to_string()))
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryQueueInner {
                ready: VecDeque::new(),
                scheduled: Vec::new(),
                tasks: HashMap::new(),
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Every task ever pushed, for assertions in tests
    pub async fn tasks(&self) -> Vec<QueuedTask> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<QueuedTask> = inner.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueue for InMemoryQueue {
    async fn enqueue(&self, task: QueuedTask) -> AppResult<Uuid> {
        let task_id = task.id;
        let due = task.is_due(OffsetDateTime::now_utc());

        let mut inner = self.inner.lock().await;
        inner.tasks.insert(task_id, task);
        if due {
            inner.ready.push_back(task_id);
        } else {
            inner.scheduled.push(task_id);
        }
        drop(inner);

        self.notify.notify_one();
        Ok(task_id)
    }

    async fn dequeue(&self, timeout_seconds: u64) -> AppResult<Option<QueuedTask>> {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(timeout_seconds);

        loop {
            let wait = {
                let mut inner = self.inner.lock().await;
                if let Some(task) = inner.take_next() {
                    return Ok(Some(task));
                }

                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    return Ok(None);
                }
                inner
                    .next_due_in(OffsetDateTime::now_utc())
                    .map_or(remaining, |due| due.min(remaining))
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.notify.notified() => {}
            }
        }
    }

    async fn get_task(&self, task_id: Uuid) -> AppResult<Option<QueuedTask>> {
        let inner = self.inner.lock().await;
        Ok(inner.tasks.get(&task_id).cloned())
    }

    async fn complete_task(&self, task_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let task = inner.task_mut(task_id)?;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn fail_task(&self, task_id: Uuid, error: String, retryable: bool) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let task = inner.task_mut(task_id)?;

        task.error_message = Some(error);

        if retryable && task.retry_count < task.max_retries {
            task.retry_count += 1;
            task.status = TaskStatus::Failed;
        } else {
            task.status = TaskStatus::Dead;
            task.completed_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn requeue(&self, task_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        let task = inner.task_mut(task_id)?;

        if task.status != TaskStatus::Failed {
            return Err(AppError::Validation(
                "Only failed tasks can be requeued".to_string(),
            ));
        }

        task.status = TaskStatus::Pending;
        task.started_at = None;
        inner.ready.push_back(task_id);
        drop(inner);

        self.notify.notify_one();
        Ok(())
    }

    async fn queue_length(&self) -> AppResult<u64> {
        let mut inner = self.inner.lock().await;
        inner.promote_due(OffsetDateTime::now_utc());
        Ok(inner.ready.len() as u64)
    }

    async fn scheduled_length(&self) -> AppResult<u64> {
        let mut inner = self.inner.lock().await;
        inner.promote_due(OffsetDateTime::now_utc());
        Ok(inner.scheduled.len() as u64)
    }
}
