//! In-process job queue with bounded concurrency and per-job retry.
//!
//! One job per order. A job is at-least-once: an attempt that fails is
//! re-driven with exponential backoff until the attempt budget is spent,
//! after which the job is abandoned and the order stays wherever the last
//! persisted transition left it.

pub mod worker;

pub use worker::OrderWorker;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::{PipelineError, Result, SwapflowError};

/// One queued unit of work, 1:1 with an order
#[derive(Debug, Clone, Copy)]
pub struct OrderJob {
    pub order_id: Uuid,
}

/// Consumer driven by the queue, once per job attempt
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run(&self, job: OrderJob) -> std::result::Result<(), PipelineError>;
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: u32,
    backoff_base_ms: u64,
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.backoff_base_ms
                .saturating_mul(1u64 << (attempt - 1).min(16)),
        )
    }
}

/// Producer-side handle: enqueue jobs, request shutdown
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<OrderJob>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl JobQueue {
    /// Start the dispatch loop; the returned handle completes once the queue
    /// has drained after `shutdown`.
    pub fn spawn(handler: Arc<dyn JobHandler>, config: QueueConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(dispatch_loop(handler, config, rx, shutdown_rx));

        (
            Self {
                tx,
                shutdown: Arc::new(shutdown_tx),
            },
            handle,
        )
    }

    /// Enqueue exactly one job for an order
    pub fn enqueue(&self, order_id: Uuid) -> Result<()> {
        if *self.shutdown.borrow() {
            return Err(SwapflowError::QueueClosed);
        }
        self.tx
            .send(OrderJob { order_id })
            .map_err(|_| SwapflowError::QueueClosed)
    }

    /// Stop accepting jobs and let the dispatcher drain in-flight work
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Signal shutdown and wait up to `drain_timeout` for the dispatcher to
    /// finish its in-flight jobs.
    pub async fn shutdown_and_drain(&self, dispatcher: JoinHandle<()>, drain_timeout: Duration) {
        self.shutdown();
        match timeout(drain_timeout, dispatcher).await {
            Ok(_) => info!("Job queue drained"),
            Err(_) => warn!(
                "Job queue drain timed out after {}s; abandoning in-flight jobs",
                drain_timeout.as_secs()
            ),
        }
    }
}

async fn dispatch_loop(
    handler: Arc<dyn JobHandler>,
    config: QueueConfig,
    mut rx: mpsc::UnboundedReceiver<OrderJob>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let retry = RetryPolicy {
        max_attempts: config.max_attempts.max(1),
        backoff_base_ms: config.backoff_base_ms,
    };
    let mut tasks = JoinSet::new();

    info!(
        concurrency = config.concurrency,
        max_attempts = retry.max_attempts,
        "Order job queue started"
    );

    loop {
        tokio::select! {
            job = rx.recv() => {
                let Some(job) = job else { break };
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let handler = handler.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    run_job(handler.as_ref(), job, retry).await;
                });
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    // Stop accepting; buffered jobs still drain through recv
                    rx.close();
                }
            }
        }
    }

    while tasks.join_next().await.is_some() {}
    info!("Order job queue stopped");
}

async fn run_job(handler: &dyn JobHandler, job: OrderJob, retry: RetryPolicy) {
    let mut attempt = 1u32;
    loop {
        match handler.run(job).await {
            Ok(()) => {
                debug!(order_id = %job.order_id, attempt, "Job completed");
                return;
            }
            Err(err) if attempt >= retry.max_attempts => {
                error!(
                    order_id = %job.order_id,
                    attempts = attempt,
                    step = err.step(),
                    error = %err,
                    "Job abandoned after retry exhaustion"
                );
                return;
            }
            Err(err) => {
                let delay = retry.backoff(attempt);
                warn!(
                    order_id = %job.order_id,
                    attempt,
                    step = err.step(),
                    error = %err,
                    "Job attempt failed, retrying in {}ms",
                    delay.as_millis()
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
