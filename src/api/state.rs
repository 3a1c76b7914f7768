use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::adapters::OrderStore;
use crate::queue::JobQueue;
use crate::services::{ActiveOrderCache, StatusFanout};

/// Shared application state for API handlers.
///
/// Every collaborator is constructed at startup and injected here; there are
/// no process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    /// Durable order store
    pub store: Arc<dyn OrderStore>,

    /// Fast-read mirror of in-flight order status
    pub cache: ActiveOrderCache,

    /// Per-order status subscriber registry
    pub fanout: StatusFanout,

    /// Producer handle into the order job queue
    pub queue: JobQueue,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: ActiveOrderCache,
        fanout: StatusFanout,
        queue: JobQueue,
    ) -> Self {
        Self {
            store,
            cache,
            fanout,
            queue,
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
