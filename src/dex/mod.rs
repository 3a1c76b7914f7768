pub mod mock;

pub use mock::MockDexRouter;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Venue;
use crate::error::Result;

/// A venue's quote for a swap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexQuote {
    pub venue: Venue,
    pub price: Decimal,
    pub fee: Decimal,
}

/// Result of executing a swap at a venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexExecution {
    pub venue: Venue,
    pub tx_ref: String,
    pub executed_price: Decimal,
}

/// Price discovery and execution against a set of DEX venues.
///
/// Both operations are latency-bearing and fallible; errors propagate to the
/// worker's state machine as routing/execution failures. The mock
/// implementation can be swapped for a real market-data integration without
/// touching the pipeline.
#[async_trait]
pub trait DexRouter: Send + Sync {
    /// Fetch competing quotes for the swap, one per venue
    async fn quote(
        &self,
        token_in: &str,
        token_out: &str,
        amount: Decimal,
    ) -> Result<Vec<DexQuote>>;

    /// Execute the swap at the chosen venue and quoted price
    async fn execute(
        &self,
        venue: Venue,
        token_in: &str,
        token_out: &str,
        amount: Decimal,
        expected_price: Decimal,
    ) -> Result<DexExecution>;
}

/// Select the quote with the lowest price.
///
/// Deterministic on ties: only a strictly lower price displaces the current
/// best, so the earlier quote in the router's stable venue order wins.
pub fn best_quote(quotes: &[DexQuote]) -> Option<&DexQuote> {
    let mut best: Option<&DexQuote> = None;
    for quote in quotes {
        match best {
            Some(current) if quote.price >= current.price => {}
            _ => best = Some(quote),
        }
    }
    best
}
