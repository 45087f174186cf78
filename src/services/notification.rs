//! Outbound notifications.
//!
//! Handlers never talk to a delivery channel directly: transitions hand their
//! events to [`dispatch`], which turns them into queue tasks. The worker later
//! renders each task into an [`OutboundMessage`] and passes it to a
//! [`NotificationSender`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::queue::{QueuedTask, TaskKind, TaskQueue};
use crate::services::workflow::ProjectEvent;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

impl DeliveryError {
    /// Client errors will not go away by sending the same payload again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::HttpStatus(status) => *status == 429 || *status >= 500,
        }
    }
}

/// Rendered message ready for a delivery channel
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub topic: &'static str,
    pub recipient: Uuid,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// POSTs messages as JSON to a configured URL
pub struct WebhookSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.url).json(message).send().await?;
        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status().as_u16()));
        }

        tracing::debug!(topic = message.topic, recipient = %message.recipient, "Webhook delivered");
        Ok(())
    }
}

/// Writes messages to the log; used when no webhook is configured
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        tracing::info!(
            topic = message.topic,
            recipient = %message.recipient,
            payload = %message.payload,
            "Notification"
        );
        Ok(())
    }
}

/// Queue one notification task per event.
///
/// Runs after the transaction that produced the events has committed.
/// Failures are logged and dropped so a queue outage never fails a request.
pub async fn dispatch(queue: &dyn TaskQueue, events: Vec<ProjectEvent>) {
    for event in events {
        let task = QueuedTask::new(TaskKind::Notify(event));
        if let Err(e) = queue.enqueue(task).await {
            tracing::warn!(
                project_id = %event.project_id,
                recipient = %event.recipient,
                kind = event.kind.as_str(),
                error = %e,
                "Failed to queue notification"
            );
        }
    }
}

/// Queue a task that is not a project notification, logging failures
pub async fn schedule(queue: &dyn TaskQueue, task: QueuedTask) {
    let kind = task.kind.as_str();
    if let Err(e) = queue.enqueue(task).await {
        tracing::warn!(kind, error = %e, "Failed to queue task");
    }
}
