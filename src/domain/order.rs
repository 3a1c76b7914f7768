use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Execution venue for a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Raydium,
    Meteora,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raydium => "raydium",
            Self::Meteora => "meteora",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Venue {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "raydium" => Ok(Self::Raydium),
            "meteora" => Ok(Self::Meteora),
            _ => Err("invalid venue; expected raydium|meteora"),
        }
    }
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order created at intake, not yet picked up by a worker
    Pending,
    /// Worker is fetching competing quotes
    Routing,
    /// Quote chosen, transaction being built/executed
    Building,
    /// Execution accepted by the venue, awaiting settlement
    Submitted,
    /// Settled; order is immutable from here on
    Confirmed,
    /// Terminal failure with a captured reason
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Failed)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Routing => "routing",
            Self::Building => "building",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "routing" => Ok(Self::Routing),
            "building" => Ok(Self::Building),
            "submitted" => Ok(Self::Submitted),
            "confirmed" => Ok(Self::Confirmed),
            "failed" => Ok(Self::Failed),
            _ => Err("invalid order status"),
        }
    }
}

/// Order (tracked in our system)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Optional caller-supplied idempotency token
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub token_in: String,
    pub token_out: String,
    pub amount: Decimal,
    pub venue: Option<Venue>,
    pub tx_ref: Option<String>,
    pub quoted_price: Option<Decimal>,
    pub executed_price: Option<Decimal>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a fresh pending order from intake fields
    pub fn new(
        token_in: String,
        token_out: String,
        amount: Decimal,
        client_order_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_order_id,
            status: OrderStatus::Pending,
            token_in,
            token_out,
            amount,
            venue: None,
            tx_ref: None,
            quoted_price: None,
            executed_price: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Metadata carried by a single status transition.
///
/// Fields are add-only over an order's lifetime; a transition never retracts
/// metadata written by an earlier one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub venue: Option<Venue>,
    pub tx_ref: Option<String>,
    pub quoted_price: Option<Decimal>,
    pub executed_price: Option<Decimal>,
    pub failure_reason: Option<String>,
}

impl OrderUpdate {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_venue(mut self, venue: Venue) -> Self {
        self.venue = Some(venue);
        self
    }

    pub fn with_tx_ref(mut self, tx_ref: impl Into<String>) -> Self {
        self.tx_ref = Some(tx_ref.into());
        self
    }

    pub fn with_quoted_price(mut self, price: Decimal) -> Self {
        self.quoted_price = Some(price);
        self
    }

    pub fn with_executed_price(mut self, price: Decimal) -> Self {
        self.executed_price = Some(price);
        self
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.venue.is_none()
            && self.tx_ref.is_none()
            && self.quoted_price.is_none()
            && self.executed_price.is_none()
            && self.failure_reason.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn terminal_states_are_exactly_confirmed_and_failed() {
        assert!(OrderStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Routing,
            OrderStatus::Building,
            OrderStatus::Submitted,
        ] {
            assert!(status.is_active(), "{status} should be active");
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Routing,
            OrderStatus::Building,
            OrderStatus::Submitted,
            OrderStatus::Confirmed,
            OrderStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn venue_round_trips_and_rejects_unknown() {
        assert_eq!("raydium".parse::<Venue>().unwrap(), Venue::Raydium);
        assert_eq!("METEORA".parse::<Venue>().unwrap(), Venue::Meteora);
        assert!("orca".parse::<Venue>().is_err());
    }

    #[test]
    fn new_order_starts_pending_with_empty_metadata() {
        let order = Order::new("SOL".into(), "USDC".into(), dec!(1), None);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.venue.is_none());
        assert!(order.tx_ref.is_none());
        assert!(order.executed_price.is_none());
        assert_eq!(order.created_at, order.updated_at);
    }
}
