use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Order, OrderStatus, Venue};

// ============================================================================
// Intake Types
// ============================================================================

/// Body of `POST /api/orders/execute`.
///
/// Required fields are modelled as `Option` so the handler can answer a
/// missing field with a 400 and a message, rather than a generic decode
/// rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteOrderRequest {
    #[serde(alias = "tokenIn")]
    pub token_in: Option<String>,
    #[serde(alias = "tokenOut")]
    pub token_out: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(default, alias = "clientOrderId")]
    pub client_order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ============================================================================
// Order Status Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub token_in: String,
    pub token_out: String,
    pub amount: Decimal,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            client_order_id: order.client_order_id,
            status: order.status,
            token_in: order.token_in,
            token_out: order.token_out,
            amount: order.amount,
            venue: order.venue,
            tx_ref: order.tx_ref,
            quoted_price: order.quoted_price,
            executed_price: order.executed_price,
            failure_reason: order.failure_reason,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub uptime_secs: i64,
}
