use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Order, OrderStatus, OrderUpdate, Venue};

/// Denormalized projection of an order's current status.
///
/// Carries the status plus whatever metadata the most recent transition
/// wrote. This is both the cache value and the WebSocket push payload; its
/// absence from the cache is an ordinary miss, the durable store stays the
/// source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub order_id: Uuid,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Snapshot of a single transition: the new status plus the metadata
    /// that transition carried.
    pub fn from_transition(order_id: Uuid, status: OrderStatus, update: &OrderUpdate) -> Self {
        Self {
            order_id,
            status,
            venue: update.venue,
            tx_ref: update.tx_ref.clone(),
            quoted_price: update.quoted_price,
            executed_price: update.executed_price,
            failure_reason: update.failure_reason.clone(),
            updated_at: Utc::now(),
        }
    }

    /// Catch-up snapshot derived from the durable record
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            venue: order.venue,
            tx_ref: order.tx_ref.clone(),
            quoted_price: order.quoted_price,
            executed_price: order.executed_price,
            failure_reason: order.failure_reason.clone(),
            updated_at: order.updated_at,
        }
    }
}
