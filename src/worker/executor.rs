use std::sync::Arc;

use serde_json::json;

use dayspick::error::AppError;
use dayspick::queue::{QueuedTask, TaskKind};
use dayspick::repositories::{ProfileRepository, ProjectRepository};
use dayspick::services::notification::DeliveryError;
use dayspick::services::{NotificationSender, OutboundMessage, ProjectEvent};
use dayspick::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl TaskError {
    /// Whether running the task again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Delivery(e) => e.is_retryable(),
            Self::App(e) => is_retryable_error(e),
        }
    }
}

/// Determine if an error is retryable
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        // Database and queue failures are usually transient
        AppError::Database(_) | AppError::Queue(_) => true,
        AppError::Internal(msg) => {
            msg.contains("timeout") || msg.contains("connection") || msg.contains("network")
        }
        // The referenced row is gone or the data is wrong; retrying won't help
        AppError::NotFound(_)
        | AppError::Validation(_)
        | AppError::Conflict(_)
        | AppError::Forbidden(_) => false,
        AppError::Unauthorized
        | AppError::InvalidCredentials
        | AppError::InvalidToken
        | AppError::TokenExpired => false,
    }
}

/// Executes queued tasks
pub struct TaskExecutor {
    state: Arc<AppState>,
    sender: Arc<dyn NotificationSender>,
}

impl TaskExecutor {
    pub fn new(state: Arc<AppState>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { state, sender }
    }

    pub async fn execute(&self, task: &QueuedTask) -> Result<(), TaskError> {
        match &task.kind {
            TaskKind::Notify(event) => self.notify(event).await,
            TaskKind::SendConfirmation {
                profile_id,
                email,
                code,
            } => {
                let message = OutboundMessage {
                    topic: "profile.confirmation",
                    recipient: *profile_id,
                    payload: json!({ "email": email, "code": code }),
                };
                self.sender.send(&message).await?;
                Ok(())
            }
            TaskKind::SweepUnconfirmed { profile_id } => {
                let ttl = time::Duration::minutes(self.state.config.unconfirmed_ttl_minutes);
                let removed =
                    ProfileRepository::delete_if_unconfirmed(&self.state.db, *profile_id, ttl)
                        .await?;
                tracing::info!(profile_id = %profile_id, removed, "Unconfirmed profile sweep");
                Ok(())
            }
        }
    }

    async fn notify(&self, event: &ProjectEvent) -> Result<(), TaskError> {
        let project = ProjectRepository::find(&self.state.db, event.project_id).await?;

        let message = OutboundMessage {
            topic: event.kind.topic(),
            recipient: event.recipient,
            payload: json!({
                "project_id": project.id,
                "title": project.title,
                "actor": event.actor,
                "event": event.kind.as_str(),
            }),
        };

        self.sender.send(&message).await?;
        Ok(())
    }
}
