use thiserror::Error;
use uuid::Uuid;

/// Main error type for the order engine
#[derive(Error, Debug)]
pub enum SwapflowError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Queue is shutting down, not accepting new jobs")]
    QueueClosed,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SwapflowError
pub type Result<T> = std::result::Result<T, SwapflowError>;

/// Failures raised while driving an order through the lifecycle pipeline.
///
/// A closed set, one variant per failing step, each carrying the order it
/// belongs to. The queue uses `is_persistence` to distinguish attempts that
/// died before reaching the store (re-drive resumes mid-pipeline) from
/// attempts where the order was already moved to `Failed`.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("routing failed for order {order_id}: {reason}")]
    Routing { order_id: Uuid, reason: String },

    #[error("execution failed for order {order_id}: {reason}")]
    Execution { order_id: Uuid, reason: String },

    #[error("persistence failed for order {order_id}: {reason}")]
    Persistence { order_id: Uuid, reason: String },

    #[error("notification failed for order {order_id}: {reason}")]
    Notification { order_id: Uuid, reason: String },
}

impl PipelineError {
    pub fn order_id(&self) -> Uuid {
        match self {
            Self::Routing { order_id, .. }
            | Self::Execution { order_id, .. }
            | Self::Persistence { order_id, .. }
            | Self::Notification { order_id, .. } => *order_id,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Routing { reason, .. }
            | Self::Execution { reason, .. }
            | Self::Persistence { reason, .. }
            | Self::Notification { reason, .. } => reason,
        }
    }

    /// Name of the pipeline step that failed
    pub fn step(&self) -> &'static str {
        match self {
            Self::Routing { .. } => "routing",
            Self::Execution { .. } => "execution",
            Self::Persistence { .. } => "persistence",
            Self::Notification { .. } => "notification",
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

impl From<PipelineError> for SwapflowError {
    fn from(err: PipelineError) -> Self {
        SwapflowError::Internal(err.to_string())
    }
}
