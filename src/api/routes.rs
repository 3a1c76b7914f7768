use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState, websocket::order_status_ws};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Order intake + status
        .route("/api/orders/execute", post(handlers::execute_order))
        .route("/api/orders/:id", get(handlers::get_order))
        // WebSocket status subscription
        .route("/api/orders/ws", get(order_status_ws))
        // Probes
        .route("/health", get(handlers::health))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
