mod executor;

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;

use dayspick::config::Config;
use dayspick::services::{LogSender, NotificationSender, WebhookSender};
use dayspick::state::AppState;

use executor::TaskExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting DaysPick worker...");

    let config = Config::from_env().context("Failed to load configuration")?;

    let sender: Arc<dyn NotificationSender> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Delivering notifications to webhook");
            Arc::new(WebhookSender::new(url.clone()).context("Failed to build webhook client")?)
        }
        None => {
            tracing::info!("No webhook configured, notifications are logged only");
            Arc::new(LogSender)
        }
    };

    tracing::info!("Connecting to database and Redis...");
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    let state = Arc::new(state);
    tracing::info!("Connections established");

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping worker...");
        let _ = shutdown_tx.send(true);
    });

    let executor = TaskExecutor::new(state.clone(), sender);

    tracing::info!("Worker started, waiting for tasks...");
    loop {
        if *shutdown_rx.borrow() {
            tracing::info!("Shutdown requested, exiting worker loop");
            break;
        }

        // Delayed tasks surface here once their run_at has passed
        match state.task_queue.dequeue(5).await {
            Ok(Some(task)) => {
                let task_id = task.id;
                let kind = task.kind.as_str();
                tracing::info!(task_id = %task_id, kind, attempt = task.retry_count + 1, "Processing task");

                match executor.execute(&task).await {
                    Ok(()) => {
                        if let Err(e) = state.task_queue.complete_task(task_id).await {
                            tracing::error!(task_id = %task_id, error = %e, "Failed to mark task as complete");
                        }
                    }
                    Err(e) => {
                        let retryable = e.is_retryable();
                        tracing::error!(
                            task_id = %task_id,
                            kind,
                            error = %e,
                            retryable,
                            "Task failed"
                        );
                        if let Err(e) = state
                            .task_queue
                            .fail_task(task_id, e.to_string(), retryable)
                            .await
                        {
                            tracing::error!(task_id = %task_id, error = %e, "Failed to mark task as failed");
                        }
                    }
                }
            }
            Ok(None) => {
                // Nothing due, dequeue already waited
            }
            Err(e) => {
                tracing::error!(error = %e, "Error dequeuing task");
                // Brief sleep on error to prevent tight loop
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }

    tracing::info!("Worker shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
