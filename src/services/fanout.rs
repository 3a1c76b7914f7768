use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::StatusSnapshot;

/// A live registration for one order's status stream.
///
/// Dropping the subscription (or the receiver) is enough to make the next
/// publish prune it; `unregister` removes it eagerly on client disconnect.
pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::UnboundedReceiver<StatusSnapshot>,
}

/// Push-notification fan-out: order id → set of subscriber channels.
///
/// Safe for concurrent register/unregister/publish from worker and
/// connection-handling tasks. Delivery to an individual subscriber is
/// best-effort; a dead subscriber is pruned without blocking the others or
/// failing the caller.
#[derive(Debug, Clone, Default)]
pub struct StatusFanout {
    subscribers: Arc<DashMap<Uuid, HashMap<u64, mpsc::UnboundedSender<StatusSnapshot>>>>,
    next_id: Arc<AtomicU64>,
}

impl StatusFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for an order's transitions
    pub fn register(&self, order_id: Uuid) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers.entry(order_id).or_default().insert(id, tx);
        debug!(%order_id, subscriber = id, "Subscriber registered");

        Subscription { id, rx }
    }

    /// Remove one subscriber; the order's entry is dropped with its last
    /// subscriber so the registry never accumulates empty sets
    pub fn unregister(&self, order_id: Uuid, subscriber_id: u64) {
        if let Some(mut entry) = self.subscribers.get_mut(&order_id) {
            entry.remove(&subscriber_id);
            if entry.is_empty() {
                drop(entry);
                self.subscribers.remove_if(&order_id, |_, subs| subs.is_empty());
            }
        }
    }

    /// Deliver a snapshot to every current subscriber of the order.
    ///
    /// Returns how many subscribers received it. Closed channels are pruned
    /// in place and never fail the publish.
    pub fn publish(&self, order_id: Uuid, snapshot: &StatusSnapshot) -> usize {
        let Some(mut entry) = self.subscribers.get_mut(&order_id) else {
            return 0;
        };

        let mut delivered = 0;
        entry.retain(|subscriber_id, tx| match tx.send(snapshot.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                debug!(%order_id, subscriber = subscriber_id, "Dropping dead subscriber");
                false
            }
        });

        let emptied = entry.is_empty();
        drop(entry);
        if emptied {
            self.subscribers.remove_if(&order_id, |_, subs| subs.is_empty());
        }

        delivered
    }

    /// Drop all registrations for an order. Senders close, so attached
    /// streams end; called by the worker at terminal state.
    pub fn release(&self, order_id: Uuid) {
        if self.subscribers.remove(&order_id).is_some() {
            debug!(%order_id, "Released subscriber registrations");
        }
    }

    /// Number of orders with at least one live subscriber
    pub fn watched_orders(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscriber_count(&self, order_id: Uuid) -> usize {
        self.subscribers
            .get(&order_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}
