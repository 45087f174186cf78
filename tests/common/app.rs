use std::sync::Arc;

use axum_test::TestServer;
use dayspick::build_router;
use dayspick::config::Config;
use dayspick::queue::{InMemoryQueue, QueuedTask};
use dayspick::state::AppState;

/// Test configuration
pub fn test_config() -> Config {
    Config {
        // Single connection: every connection to `sqlite::memory:` is a separate database
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        redis_url: "redis://localhost:6379".to_string(),
        jwt_secret: "test-jwt-secret-that-is-at-least-32-characters-long".to_string(),
        jwt_expiration_hours: 24,
        host: "127.0.0.1".to_string(),
        port: 0,
        notify_webhook_url: None,
        unconfirmed_ttl_minutes: 30,
    }
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub queue: Arc<InMemoryQueue>,
}

#[allow(dead_code)]
impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let config = test_config();

        // Use InMemoryQueue for testing (avoids Redis dependency in tests)
        let queue = Arc::new(InMemoryQueue::new());

        let state = AppState::with_queue(config, queue.clone())
            .await
            .expect("Failed to create test app state");

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            queue,
        }
    }

    /// Every task queued so far, oldest first
    pub async fn queued(&self) -> Vec<QueuedTask> {
        self.queue.tasks().await
    }
}
