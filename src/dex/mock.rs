use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::config::RouterConfig;
use crate::domain::Venue;
use crate::error::Result;

use super::{DexExecution, DexQuote, DexRouter};

/// Stand-in execution router: quotes both venues around a configured base
/// price and simulates settlement latency. Side-effect-free except for the
/// latency it models, so it can be replaced by a real venue integration
/// without changing the pipeline.
pub struct MockDexRouter {
    config: RouterConfig,
}

impl MockDexRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Price factor in basis points, applied to the base price
    fn priced(&self, bps: i64) -> Decimal {
        self.config.base_price * Decimal::from(bps) / Decimal::from(10_000)
    }

    async fn venue_quote(&self, venue: Venue) -> DexQuote {
        // Per-venue price bands: Raydium 0.98-1.02x, Meteora 0.97-1.02x
        let (band_lo, band_hi, fee) = match venue {
            Venue::Raydium => (9_800, 10_200, Decimal::new(3, 3)),
            Venue::Meteora => (9_700, 10_200, Decimal::new(2, 3)),
        };
        let bps = rand::thread_rng().gen_range(band_lo..band_hi);

        sleep(Duration::from_millis(self.config.quote_latency_ms)).await;

        DexQuote {
            venue,
            price: self.priced(bps),
            fee,
        }
    }

    fn random_tx_ref() -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        format!("0x{}", hex::encode(bytes))
    }
}

#[async_trait]
impl DexRouter for MockDexRouter {
    async fn quote(
        &self,
        token_in: &str,
        token_out: &str,
        amount: Decimal,
    ) -> Result<Vec<DexQuote>> {
        let (raydium, meteora) = tokio::join!(
            self.venue_quote(Venue::Raydium),
            self.venue_quote(Venue::Meteora),
        );

        debug!(
            token_in,
            token_out,
            %amount,
            raydium = %raydium.price,
            meteora = %meteora.price,
            "Fetched competing quotes"
        );

        Ok(vec![raydium, meteora])
    }

    async fn execute(
        &self,
        venue: Venue,
        token_in: &str,
        token_out: &str,
        amount: Decimal,
        expected_price: Decimal,
    ) -> Result<DexExecution> {
        let (latency_ms, slippage_bps) = {
            let mut rng = rand::thread_rng();
            let latency = rng.gen_range(
                self.config.execute_latency_min_ms..=self.config.execute_latency_max_ms,
            );
            // Fill within 0.995-1.005x of the quoted price
            (latency, rng.gen_range(9_950..10_050))
        };

        sleep(Duration::from_millis(latency_ms)).await;

        let executed_price = expected_price * Decimal::from(slippage_bps) / Decimal::from(10_000);
        let tx_ref = Self::random_tx_ref();

        debug!(
            %venue,
            token_in,
            token_out,
            %amount,
            %expected_price,
            %executed_price,
            tx_ref,
            "Executed swap"
        );

        Ok(DexExecution {
            venue,
            tx_ref,
            executed_price,
        })
    }
}
