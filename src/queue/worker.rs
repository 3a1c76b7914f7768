use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::adapters::OrderStore;
use crate::dex::{best_quote, DexRouter};
use crate::domain::{Order, OrderStatus, OrderUpdate, StatusSnapshot};
use crate::error::PipelineError;
use crate::services::{ActiveOrderCache, StatusFanout};

use super::{JobHandler, OrderJob};

/// Drives orders through the lifecycle state machine.
///
/// The worker is the single writer of order state while a job runs. Every
/// transition is persisted to the durable store first (the durability
/// boundary), then mirrored to the status cache, then pushed to subscribers;
/// terminal transitions additionally clear the cache entry and release the
/// order's subscriber registrations.
///
/// Jobs are redelivered at-least-once, so processing always resumes from the
/// order's last persisted state and terminal orders are left untouched.
pub struct OrderWorker {
    store: Arc<dyn OrderStore>,
    cache: ActiveOrderCache,
    fanout: StatusFanout,
    router: Arc<dyn DexRouter>,
    confirm_delay: Duration,
}

impl OrderWorker {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: ActiveOrderCache,
        fanout: StatusFanout,
        router: Arc<dyn DexRouter>,
        confirm_delay: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            fanout,
            router,
            confirm_delay,
        }
    }

    /// Run one job attempt for an order
    pub async fn process(&self, order_id: Uuid) -> Result<(), PipelineError> {
        let order = self
            .store
            .find_order(order_id)
            .await
            .map_err(|e| PipelineError::Persistence {
                order_id,
                reason: e.to_string(),
            })?
            .ok_or_else(|| PipelineError::Persistence {
                order_id,
                reason: "order not found".to_string(),
            })?;

        if order.status.is_terminal() {
            info!(
                %order_id,
                status = %order.status,
                "Job redelivered for terminal order, nothing to do"
            );
            return Ok(());
        }

        debug!(%order_id, status = %order.status, "Worker picked up order");

        match self.drive(&order).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_persistence() => {
                // The store refused a write; nothing to record, the queue
                // re-drives from the last persisted state.
                Err(err)
            }
            Err(err) => {
                warn!(
                    %order_id,
                    step = err.step(),
                    reason = err.reason(),
                    "Pipeline step failed, marking order failed"
                );
                let update = OrderUpdate::none().with_failure_reason(err.reason());
                if let Err(persist_err) = self
                    .transition(order_id, OrderStatus::Failed, update)
                    .await
                {
                    error!(
                        %order_id,
                        error = %persist_err,
                        "Could not record order failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Run the remaining pipeline steps from the order's last persisted state
    async fn drive(&self, order: &Order) -> Result<(), PipelineError> {
        let order_id = order.id;
        let mut status = order.status;
        let mut venue = order.venue;
        let mut quoted_price = order.quoted_price;
        let mut tx_ref = order.tx_ref.clone();
        let mut executed_price = order.executed_price;

        if status == OrderStatus::Pending {
            self.transition(order_id, OrderStatus::Routing, OrderUpdate::none())
                .await?;
            status = OrderStatus::Routing;
        }

        if status == OrderStatus::Routing {
            let quotes = self
                .router
                .quote(&order.token_in, &order.token_out, order.amount)
                .await
                .map_err(|e| PipelineError::Routing {
                    order_id,
                    reason: e.to_string(),
                })?;

            let best = best_quote(&quotes).ok_or_else(|| PipelineError::Routing {
                order_id,
                reason: "no venue returned a quote".to_string(),
            })?;

            venue = Some(best.venue);
            quoted_price = Some(best.price);
            let update = OrderUpdate::none()
                .with_venue(best.venue)
                .with_quoted_price(best.price);
            self.transition(order_id, OrderStatus::Building, update)
                .await?;
            status = OrderStatus::Building;
        }

        if status == OrderStatus::Building {
            let venue_chosen = venue.ok_or_else(|| PipelineError::Execution {
                order_id,
                reason: "order is building without a chosen venue".to_string(),
            })?;
            let price = quoted_price.ok_or_else(|| PipelineError::Execution {
                order_id,
                reason: "order is building without a quoted price".to_string(),
            })?;

            let exec = self
                .router
                .execute(
                    venue_chosen,
                    &order.token_in,
                    &order.token_out,
                    order.amount,
                    price,
                )
                .await
                .map_err(|e| PipelineError::Execution {
                    order_id,
                    reason: e.to_string(),
                })?;

            tx_ref = Some(exec.tx_ref.clone());
            executed_price = Some(exec.executed_price);
            // The executed price is persisted here too, so a redelivery that
            // resumes from `submitted` can confirm without re-executing.
            let update = OrderUpdate::none()
                .with_venue(exec.venue)
                .with_tx_ref(exec.tx_ref)
                .with_executed_price(exec.executed_price);
            self.transition(order_id, OrderStatus::Submitted, update)
                .await?;
            status = OrderStatus::Submitted;
        }

        if status == OrderStatus::Submitted {
            // Fixed settlement delay; a real integration would poll the venue
            sleep(self.confirm_delay).await;

            let venue_chosen = venue.ok_or_else(|| PipelineError::Execution {
                order_id,
                reason: "order was submitted without a chosen venue".to_string(),
            })?;
            let final_tx_ref = tx_ref.ok_or_else(|| PipelineError::Execution {
                order_id,
                reason: "order was submitted without a transaction reference".to_string(),
            })?;
            let final_price = executed_price.ok_or_else(|| PipelineError::Execution {
                order_id,
                reason: "order was submitted without an executed price".to_string(),
            })?;

            let update = OrderUpdate::none()
                .with_venue(venue_chosen)
                .with_tx_ref(final_tx_ref)
                .with_executed_price(final_price);
            self.transition(order_id, OrderStatus::Confirmed, update)
                .await?;
        }

        Ok(())
    }

    /// Apply one status transition across the store, cache and fan-out.
    ///
    /// Store write first; a failure there fails the attempt. Cache and
    /// fan-out mirror afterwards, and notification delivery is best-effort.
    async fn transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        update: OrderUpdate,
    ) -> Result<(), PipelineError> {
        self.store
            .apply_transition(order_id, status, &update)
            .await
            .map_err(|e| PipelineError::Persistence {
                order_id,
                reason: e.to_string(),
            })?;

        let snapshot = StatusSnapshot::from_transition(order_id, status, &update);
        self.cache.put(order_id, snapshot.clone());

        let delivered = self.fanout.publish(order_id, &snapshot);
        debug!(%order_id, %status, delivered, "Transition applied");

        if status.is_terminal() {
            self.cache.remove(order_id);
            self.fanout.release(order_id);
        }

        Ok(())
    }
}

#[async_trait]
impl JobHandler for OrderWorker {
    async fn run(&self, job: OrderJob) -> Result<(), PipelineError> {
        self.process(job.order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MockOrderStore;
    use crate::config::CacheConfig;
    use crate::dex::{DexExecution, DexQuote};
    use crate::domain::Venue;
    use crate::error::SwapflowError;
    use mockall::predicate::eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted router for exercising the worker without venue latency
    #[derive(Default)]
    struct StubRouter {
        fail_quote: bool,
        empty_quotes: bool,
        fail_execute: bool,
        quote_calls: AtomicU32,
        execute_calls: AtomicU32,
    }

    #[async_trait]
    impl DexRouter for StubRouter {
        async fn quote(
            &self,
            _token_in: &str,
            _token_out: &str,
            _amount: Decimal,
        ) -> crate::error::Result<Vec<DexQuote>> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_quote {
                return Err(SwapflowError::Internal("venue unreachable".to_string()));
            }
            if self.empty_quotes {
                return Ok(Vec::new());
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
        ) -> crate::error::Result<DexExecution> {
            self.execute_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_execute {
                return Err(SwapflowError::Internal("venue rejected swap".to_string()));
            }
            Ok(DexExecution {
                venue,
                tx_ref: "0xabc".to_string(),
                executed_price: expected_price,
            })
        }
    }

    fn worker_with(store: MockOrderStore, router: Arc<StubRouter>) -> OrderWorker {
        OrderWorker::new(
            Arc::new(store),
            ActiveOrderCache::new(&CacheConfig {
                ttl_secs: 300,
                max_entries: 100,
            }),
            StatusFanout::new(),
            router,
            Duration::from_millis(0),
        )
    }

    fn order_at(status: OrderStatus) -> Order {
        let mut order = Order::new("SOL".into(), "USDC".into(), dec!(1), None);
        order.status = status;
        order
    }

    #[tokio::test]
    async fn terminal_order_is_left_untouched() {
        let order = order_at(OrderStatus::Confirmed);
        let order_id = order.id;

        let mut store = MockOrderStore::new();
        store
            .expect_find_order()
            .with(eq(order_id))
            .return_once(move |_| Ok(Some(order)));
        store.expect_apply_transition().never();

        let router = Arc::new(StubRouter::default());
        let worker = worker_with(store, router.clone());
        worker.process(order_id).await.unwrap();

        assert_eq!(router.quote_calls.load(Ordering::SeqCst), 0);
        assert_eq!(router.execute_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resume_from_building_skips_quoting() {
        let mut order = order_at(OrderStatus::Building);
        order.venue = Some(Venue::Meteora);
        order.quoted_price = Some(dec!(9.9));
        let order_id = order.id;

        let mut store = MockOrderStore::new();
        store
            .expect_find_order()
            .return_once(move |_| Ok(Some(order)));
        // building -> submitted, submitted -> confirmed
        store
            .expect_apply_transition()
            .times(2)
            .returning(|_, _, _| Ok(()));

        let router = Arc::new(StubRouter::default());
        let worker = worker_with(store, router.clone());
        worker.process(order_id).await.unwrap();

        assert_eq!(router.quote_calls.load(Ordering::SeqCst), 0);
        assert_eq!(router.execute_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quote_failure_marks_order_failed() {
        let order = order_at(OrderStatus::Pending);
        let order_id = order.id;

        let mut store = MockOrderStore::new();
        store
            .expect_find_order()
            .return_once(move |_| Ok(Some(order)));
        // pending -> routing, then routing -> failed
        store
            .expect_apply_transition()
            .withf(|_, status, _| *status == OrderStatus::Routing)
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_apply_transition()
            .withf(|_, status, update| {
                *status == OrderStatus::Failed && update.failure_reason.is_some()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let router = Arc::new(StubRouter {
            fail_quote: true,
            ..StubRouter::default()
        });
        let worker = worker_with(store, router.clone());

        let err = worker.process(order_id).await.unwrap_err();
        assert_eq!(err.step(), "routing");
        assert_eq!(router.execute_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_quote_list_is_a_routing_failure() {
        let order = order_at(OrderStatus::Routing);
        let order_id = order.id;

        let mut store = MockOrderStore::new();
        store
            .expect_find_order()
            .return_once(move |_| Ok(Some(order)));
        store
            .expect_apply_transition()
            .withf(|_, status, _| *status == OrderStatus::Failed)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let router = Arc::new(StubRouter {
            empty_quotes: true,
            ..StubRouter::default()
        });
        let worker = worker_with(store, router);

        let err = worker.process(order_id).await.unwrap_err();
        assert_eq!(err.step(), "routing");
        assert!(err.reason().contains("no venue"));
    }

    #[tokio::test]
    async fn persistence_failure_aborts_without_failure_marking() {
        let order = order_at(OrderStatus::Pending);
        let order_id = order.id;

        let mut store = MockOrderStore::new();
        store
            .expect_find_order()
            .return_once(move |_| Ok(Some(order)));
        // The very first transition write is refused; the worker must not
        // try to mark the order failed through the same broken store.
        store
            .expect_apply_transition()
            .times(1)
            .returning(|_, _, _| Err(SwapflowError::Internal("pool exhausted".to_string())));

        let router = Arc::new(StubRouter::default());
        let worker = worker_with(store, router.clone());

        let err = worker.process(order_id).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(router.quote_calls.load(Ordering::SeqCst), 0);
    }
}
