use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::services::workflow::ProjectEvent;

/// Task status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in queue (or for its `run_at`)
    Pending,
    /// Picked up by a worker
    Running,
    Completed,
    /// Failed, will be retried
    Failed,
    /// Failed permanently (max retries exceeded)
    Dead,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Dead)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Dead => "dead",
        }
    }
}

/// Work the background worker knows how to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Tell the other party about a project transition
    Notify(ProjectEvent),
    /// Deliver the signup confirmation code
    SendConfirmation {
        profile_id: Uuid,
        email: Option<String>,
        code: String,
    },
    /// Remove a profile that never confirmed its account
    SweepUnconfirmed { profile_id: Uuid },
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notify(_) => "notify",
            Self::SendConfirmation { .. } => "send_confirmation",
            Self::SweepUnconfirmed { .. } => "sweep_unconfirmed",
        }
    }
}

/// Task stored in the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: Uuid,
    pub kind: TaskKind,
    pub status: TaskStatus,

    /// Not handed out before this instant
    #[serde(with = "time::serde::rfc3339")]
    pub run_at: OffsetDateTime,

    pub retry_count: u32,
    pub max_retries: u32,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,

    pub error_message: Option<String>,
}

impl QueuedTask {
    pub fn new(kind: TaskKind) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            kind,
            status: TaskStatus::Pending,
            run_at: now,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    /// Postpone the task by `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.run_at = self.created_at + delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        self.run_at <= now
    }
}
