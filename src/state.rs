use std::sync::Arc;

use redis::aio::ConnectionManager as RedisConnectionManager;
use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::db;
use crate::queue::{RedisQueue, TaskQueue};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// SeaORM database connection
    pub db: DatabaseConnection,
    pub config: Config,
    /// Queue for notifications and delayed account sweeps
    pub task_queue: Arc<dyn TaskQueue>,
}

impl AppState {
    /// Create a new AppState by connecting to the database and Redis
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        // Connect to Redis
        let redis_client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| AppStateError::Redis(e.to_string()))?;
        let redis = RedisConnectionManager::new(redis_client)
            .await
            .map_err(|e| AppStateError::Redis(e.to_string()))?;

        // Create task queue using Redis
        let task_queue: Arc<dyn TaskQueue> = Arc::new(RedisQueue::new(redis));

        Self::with_queue(config, task_queue).await
    }

    /// Create AppState with a custom queue (for testing)
    pub async fn with_queue(
        config: Config,
        task_queue: Arc<dyn TaskQueue>,
    ) -> Result<Self, AppStateError> {
        let db = db::connect(&config)
            .await
            .map_err(|e| AppStateError::Database(e.to_string()))?;

        db::setup_schema(&db)
            .await
            .map_err(|e| AppStateError::Schema(e.to_string()))?;

        Ok(Self {
            db,
            config,
            task_queue,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("Database connection error: {0}")]
    Database(String),

    #[error("Schema setup error: {0}")]
    Schema(String),

    #[error("Redis connection error: {0}")]
    Redis(String),
}
