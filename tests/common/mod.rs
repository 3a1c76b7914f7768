//! Shared test doubles for the pipeline and API integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use swapflow::adapters::OrderStore;
use swapflow::config::{CacheConfig, RouterConfig};
use swapflow::dex::{DexExecution, DexQuote, DexRouter};
use swapflow::domain::{Order, OrderStatus, OrderUpdate, Venue};
use swapflow::error::{Result, SwapflowError};

/// In-memory stand-in for the Postgres store.
///
/// Records every status write in order (the insert counts as the `pending`
/// write) and can be told to refuse a number of upcoming writes to exercise
/// the queue's re-drive path.
#[derive(Default)]
pub struct MemoryStore {
    orders: Mutex<HashMap<Uuid, Order>>,
    history: Mutex<Vec<(Uuid, OrderStatus)>>,
    fail_next_writes: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` writes with an injected error
    pub fn fail_next_writes(&self, count: u32) {
        self.fail_next_writes.store(count, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_next_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Seed an order directly, bypassing history recording
    pub fn seed(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        self.orders.lock().unwrap().get(&order_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    /// Status writes observed for one order, in write order
    pub fn history_for(&self, order_id: Uuid) -> Vec<OrderStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        if self.take_injected_failure() {
            return Err(SwapflowError::Internal("injected write failure".into()));
        }
        self.orders.lock().unwrap().insert(order.id, order.clone());
        self.history.lock().unwrap().push((order.id, order.status));
        Ok(())
    }

    async fn apply_transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        update: &OrderUpdate,
    ) -> Result<()> {
        if self.take_injected_failure() {
            return Err(SwapflowError::Internal("injected write failure".into()));
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&order_id)
            .ok_or(SwapflowError::OrderNotFound(order_id))?;

        // Same partial-write semantics as the COALESCE update in Postgres
        order.status = status;
        if let Some(venue) = update.venue {
            order.venue = Some(venue);
        }
        if let Some(tx_ref) = &update.tx_ref {
            order.tx_ref = Some(tx_ref.clone());
        }
        if let Some(price) = update.quoted_price {
            order.quoted_price = Some(price);
        }
        if let Some(price) = update.executed_price {
            order.executed_price = Some(price);
        }
        if let Some(reason) = &update.failure_reason {
            order.failure_reason = Some(reason.clone());
        }
        order.updated_at = chrono::Utc::now();
        drop(orders);

        self.history.lock().unwrap().push((order_id, status));
        Ok(())
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&order_id).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Where a scripted router should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    None,
    Quote,
    Execute,
}

/// Deterministic router double with call counting
pub struct ScriptedRouter {
    pub fail_at: FailPoint,
    pub quote_calls: AtomicU32,
    pub execute_calls: AtomicU32,
}

impl ScriptedRouter {
    pub fn new(fail_at: FailPoint) -> Self {
        Self {
            fail_at,
            quote_calls: AtomicU32::new(0),
            execute_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl DexRouter for ScriptedRouter {
    async fn quote(
        &self,
        _token_in: &str,
        _token_out: &str,
        _amount: Decimal,
    ) -> Result<Vec<DexQuote>> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailPoint::Quote {
            return Err(SwapflowError::Internal("all venues unreachable".into()));
        }
        Ok(vec![
            DexQuote {
                venue: Venue::Raydium,
                price: dec!(10.1),
                fee: dec!(0.003),
            },
            DexQuote {
                venue: Venue::Meteora,
                price: dec!(9.9),
                fee: dec!(0.002),
            },
        ])
    }

    async fn execute(
        &self,
        venue: Venue,
        _token_in: &str,
        _token_out: &str,
        _amount: Decimal,
        expected_price: Decimal,
    ) -> Result<DexExecution> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == FailPoint::Execute {
            return Err(SwapflowError::Internal("venue rejected the swap".into()));
        }
        Ok(DexExecution {
            venue,
            tx_ref: format!("0x{}", "ab".repeat(32)),
            executed_price: expected_price,
        })
    }
}

/// Cache config with a generous TTL for tests
pub fn test_cache_config() -> CacheConfig {
    CacheConfig {
        ttl_secs: 300,
        max_entries: 100,
    }
}

/// Router config with no simulated latency
pub fn instant_router_config() -> RouterConfig {
    RouterConfig {
        base_price: dec!(10),
        quote_latency_ms: 0,
        execute_latency_min_ms: 0,
        execute_latency_max_ms: 0,
        confirm_delay_ms: 0,
    }
}
