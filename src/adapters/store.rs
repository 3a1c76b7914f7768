use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Order, OrderStatus, OrderUpdate};
use crate::error::Result;

/// Durable order store.
///
/// The worker is the single writer during processing; the API layer inserts
/// the initial record and reads projections. Behind a trait so tests swap in
/// an in-memory fake without a live database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a freshly created order (status `pending`)
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Apply one status transition: the new status, any metadata the
    /// transition carried, and a refreshed `updated_at`. Partial write —
    /// absent metadata fields are left untouched.
    async fn apply_transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        update: &OrderUpdate,
    ) -> Result<()>;

    /// Fetch an order by id
    async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>>;

    /// Cheap liveness probe for the health endpoint
    async fn ping(&self) -> Result<()>;
}
