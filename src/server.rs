use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tracing::info;

use crate::adapters::{OrderStore, PostgresStore};
use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::dex::MockDexRouter;
use crate::error::{Result, SwapflowError};
use crate::queue::{JobQueue, OrderWorker};
use crate::services::{ActiveOrderCache, StatusFanout};

/// Connect the durable store, run migrations and serve until shutdown
pub async fn run(config: AppConfig) -> Result<()> {
    let store = Arc::new(
        PostgresStore::new(&config.database.url, config.database.max_connections).await?,
    );
    store.migrate().await?;

    serve_with_store(config, store).await
}

/// Wire every component together around an injected store and serve.
///
/// All collaborators are constructed here and handed to the worker and the
/// API layer; shutdown stops intake first, then drains in-flight jobs.
pub async fn serve_with_store(config: AppConfig, store: Arc<dyn OrderStore>) -> Result<()> {
    let cache = ActiveOrderCache::new(&config.cache);
    let fanout = StatusFanout::new();
    let router = Arc::new(MockDexRouter::new(config.router.clone()));

    let worker = Arc::new(OrderWorker::new(
        store.clone(),
        cache.clone(),
        fanout.clone(),
        router,
        Duration::from_millis(config.router.confirm_delay_ms),
    ));
    let (queue, dispatcher) = JobQueue::spawn(worker, config.queue.clone());

    let state = AppState::new(store, cache, fanout, queue.clone());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| SwapflowError::Internal(format!("invalid bind address: {e}")))?;
    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown requested, draining order queue");
    queue
        .shutdown_and_drain(
            dispatcher,
            Duration::from_secs(config.queue.drain_timeout_secs),
        )
        .await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
