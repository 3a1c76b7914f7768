use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::domain::StatusSnapshot;

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: StatusSnapshot,
    expires_at: DateTime<Utc>,
}

/// Fast-read mirror of in-flight order status (thread-safe, lock-free) with
/// TTL support and size limits.
///
/// Every `put` refreshes the expiry, so the TTL runs from the last write,
/// not from creation. A missing or expired entry is an ordinary cache miss;
/// callers fall back to the durable store.
#[derive(Debug, Clone)]
pub struct ActiveOrderCache {
    entries: Arc<DashMap<Uuid, CacheEntry>>,
    ttl: Duration,
    max_size: usize,
}

impl ActiveOrderCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::seconds(config.ttl_secs as i64),
            max_size: config.max_entries,
        }
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Utc::now() > entry.expires_at
    }

    /// Upsert the snapshot for an order, refreshing its expiry
    pub fn put(&self, order_id: Uuid, snapshot: StatusSnapshot) {
        if self.entries.len() >= self.max_size {
            self.cleanup_expired();
        }

        self.entries.insert(
            order_id,
            CacheEntry {
                snapshot,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    /// Read the current snapshot; expired entries read as absent and are
    /// evicted on the way out
    pub fn get(&self, order_id: Uuid) -> Option<StatusSnapshot> {
        let expired = match self.entries.get(&order_id) {
            Some(entry) if Self::is_expired(&entry) => true,
            Some(entry) => return Some(entry.snapshot.clone()),
            None => return None,
        };
        if expired {
            self.entries.remove(&order_id);
        }
        None
    }

    pub fn remove(&self, order_id: Uuid) {
        self.entries.remove(&order_id);
    }

    /// Drop every expired entry, returning how many were evicted
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !Self::is_expired(entry));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!("Evicted {} expired status snapshots", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
