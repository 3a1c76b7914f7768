use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::{state::AppState, types::*};
use crate::domain::Order;
use crate::error::SwapflowError;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message)),
    )
}

/// POST /api/orders/execute
///
/// Validates the intake request, persists the order in `pending` state and
/// enqueues exactly one job for it.
pub async fn execute_order(
    State(state): State<AppState>,
    Json(body): Json<ExecuteOrderRequest>,
) -> Result<Json<ExecuteOrderResponse>, ApiError> {
    let token_in = body.token_in.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let token_out = body.token_out.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let (Some(token_in), Some(token_out), Some(amount)) = (token_in, token_out, body.amount)
    else {
        return Err(bad_request("token_in, token_out, amount are required"));
    };

    if amount <= Decimal::ZERO {
        return Err(bad_request("amount must be positive"));
    }

    let order = Order::new(token_in, token_out, amount, body.client_order_id);
    let order_id = order.id;

    state.store.insert_order(&order).await.map_err(|e| {
        error!(%order_id, error = %e, "Failed to persist new order");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("failed to create order")),
        )
    })?;

    state.queue.enqueue(order_id).map_err(|e| {
        let status = match e {
            SwapflowError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(%order_id, error = %e, "Failed to enqueue order job");
        (status, Json(ErrorResponse::new("order intake is unavailable")))
    })?;

    info!(
        %order_id,
        token_in = %order.token_in,
        token_out = %order.token_out,
        amount = %order.amount,
        "Order accepted"
    );

    Ok(Json(ExecuteOrderResponse { order_id }))
}

/// GET /api/orders/:id — durable-store projection of an order
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.store.find_order(order_id).await.map_err(|e| {
        error!(%order_id, error = %e, "Order lookup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("order lookup failed")),
        )
    })?;

    match order {
        Some(order) => Ok(Json(order.into())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("order not found")),
        )),
    }
}

/// GET /health
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let db_up = state.store.ping().await.is_ok();

    let response = HealthResponse {
        status: if db_up { "ok" } else { "degraded" }.to_string(),
        db: if db_up { "up" } else { "down" }.to_string(),
        uptime_secs: state.uptime_seconds(),
    };

    let code = if db_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}
