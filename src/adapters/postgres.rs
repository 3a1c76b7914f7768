use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::adapters::store::OrderStore;
use crate::domain::{Order, OrderStatus, OrderUpdate, Venue};
use crate::error::Result;

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: &sqlx::postgres::PgRow) -> Order {
        let status: String = row.get("status");
        let venue: Option<String> = row.get("venue");
        Order {
            id: row.get("id"),
            client_order_id: row.get("client_order_id"),
            status: OrderStatus::from_str(&status).unwrap_or(OrderStatus::Failed),
            token_in: row.get("token_in"),
            token_out: row.get("token_out"),
            amount: row.get("amount"),
            venue: venue.and_then(|v| Venue::from_str(&v).ok()),
            tx_ref: row.get("tx_ref"),
            quoted_price: row.get("quoted_price"),
            executed_price: row.get("executed_price"),
            failure_reason: row.get("failure_reason"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, client_order_id, status, token_in, token_out, amount,
                 venue, tx_ref, quoted_price, executed_price, failure_reason,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id)
        .bind(&order.client_order_id)
        .bind(order.status.as_str())
        .bind(&order.token_in)
        .bind(&order.token_out)
        .bind(order.amount)
        .bind(order.venue.map(|v| v.as_str()))
        .bind(&order.tx_ref)
        .bind(order.quoted_price)
        .bind(order.executed_price)
        .bind(&order.failure_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, update))]
    async fn apply_transition(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        update: &OrderUpdate,
    ) -> Result<()> {
        // Partial write: status and updated_at always, metadata only when the
        // transition carried it (metadata is add-only over the lifecycle).
        sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                venue = COALESCE($3, venue),
                tx_ref = COALESCE($4, tx_ref),
                quoted_price = COALESCE($5, quoted_price),
                executed_price = COALESCE($6, executed_price),
                failure_reason = COALESCE($7, failure_reason),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(status.as_str())
        .bind(update.venue.map(|v| v.as_str()))
        .bind(&update.tx_ref)
        .bind(update.quoted_price)
        .bind(update.executed_price)
        .bind(&update.failure_reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, client_order_id, status, token_in, token_out, amount,
                   venue, tx_ref, quoted_price, executed_price, failure_reason,
                   created_at, updated_at
            FROM orders WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Self::row_to_order(&r)))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
