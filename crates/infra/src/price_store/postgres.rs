//! Postgres-backed price store.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (check constraint violation) | `23514` | `Corrupt` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Database` |
//!
//! ## Transactions
//!
//! `begin()` opens a SQL transaction at the database's default isolation
//! level (READ COMMITTED). That makes the writes of one manager operation
//! atomic, but two concurrent transactions can still both read "no other
//! active price" and commit two ACTIVE rows for one product. No row locking
//! is added here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Executor, PgPool, Postgres, Row, Transaction};
use tokio::sync::Mutex;
use tracing::{Span, instrument};

use pricing_core::{PriceId, ProductId};
use pricing_domain::{
    Amount, CurrencyCode, NewPrice, Price, PriceStatus, PriceStore, StoreError, StoreResult,
    TransactionalPriceStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_create_prices.sql");

/// Postgres price store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool which is thread-safe (Arc + Send + Sync).
/// Calls made directly on the store run in autocommit mode; use `begin()` to
/// group writes.
#[derive(Debug, Clone)]
pub struct PostgresPriceStore {
    pool: Arc<PgPool>,
}

impl PostgresPriceStore {
    /// Create a new PostgresPriceStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `prices` table and its indexes if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl PriceStore for PostgresPriceStore {
    #[instrument(skip(self, price), fields(product_id = %price.product_id), err)]
    async fn insert(&self, price: NewPrice) -> StoreResult<Price> {
        insert_price(&*self.pool, price).await
    }

    #[instrument(skip(self, price), fields(price_id = %price.id), err)]
    async fn update(&self, price: Price) -> StoreResult<Price> {
        update_price(&*self.pool, price).await
    }

    #[instrument(skip(self), fields(price_id = %id), err)]
    async fn find_by_id(&self, id: PriceId) -> StoreResult<Option<Price>> {
        select_by_id(&*self.pool, id).await
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn find_by_product(&self, product_id: ProductId) -> StoreResult<Vec<Price>> {
        select_by_product(&*self.pool, product_id).await
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn find_active_by_product(&self, product_id: ProductId) -> StoreResult<Option<Price>> {
        select_active(&*self.pool, product_id).await
    }
}

#[async_trait]
impl TransactionalPriceStore for PostgresPriceStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> StoreResult<PostgresTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresTransaction { tx: Mutex::new(tx) })
    }

    async fn commit(&self, tx: PostgresTransaction) -> StoreResult<()> {
        tx.tx
            .into_inner()
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

/// Open SQL transaction. Dropping it without commit rolls back.
pub struct PostgresTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl PriceStore for PostgresTransaction {
    async fn insert(&self, price: NewPrice) -> StoreResult<Price> {
        let mut tx = self.tx.lock().await;
        insert_price(&mut **tx, price).await
    }

    async fn update(&self, price: Price) -> StoreResult<Price> {
        let mut tx = self.tx.lock().await;
        update_price(&mut **tx, price).await
    }

    async fn find_by_id(&self, id: PriceId) -> StoreResult<Option<Price>> {
        let mut tx = self.tx.lock().await;
        select_by_id(&mut **tx, id).await
    }

    async fn find_by_product(&self, product_id: ProductId) -> StoreResult<Vec<Price>> {
        let mut tx = self.tx.lock().await;
        select_by_product(&mut **tx, product_id).await
    }

    async fn find_active_by_product(&self, product_id: ProductId) -> StoreResult<Option<Price>> {
        let mut tx = self.tx.lock().await;
        select_active(&mut **tx, product_id).await
    }
}

// Queries are written once against any executor (pool or open transaction).

async fn insert_price<'e, E>(exec: E, price: NewPrice) -> StoreResult<Price>
where
    E: Executor<'e, Database = Postgres>,
{
    let id = PriceId::new();
    let row = sqlx::query(
        r#"
        INSERT INTO prices (
            id,
            product_id,
            amount,
            currency,
            status,
            effective_from,
            effective_to,
            created_at,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(id.as_uuid())
    .bind(price.product_id.as_uuid())
    .bind(price.amount.value())
    .bind(price.currency.as_str())
    .bind(price.status.as_str())
    .bind(price.effective_from)
    .bind(price.effective_to)
    .fetch_one(exec)
    .await
    .map_err(|e| map_sqlx_error("insert_price", e))?;

    decode(&row)
}

async fn update_price<'e, E>(exec: E, price: Price) -> StoreResult<Price>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(
        r#"
        UPDATE prices
        SET
            amount = $2,
            currency = $3,
            status = $4,
            effective_from = $5,
            effective_to = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(price.id.as_uuid())
    .bind(price.amount.value())
    .bind(price.currency.as_str())
    .bind(price.status.as_str())
    .bind(price.effective_from)
    .bind(price.effective_to)
    .fetch_optional(exec)
    .await
    .map_err(|e| map_sqlx_error("update_price", e))?;

    match row {
        Some(row) => decode(&row),
        None => Err(StoreError::Missing(price.id)),
    }
}

async fn select_by_id<'e, E>(exec: E, id: PriceId) -> StoreResult<Option<Price>>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query("SELECT * FROM prices WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(exec)
        .await
        .map_err(|e| map_sqlx_error("select_by_id", e))?;

    row.as_ref().map(decode).transpose()
}

async fn select_by_product<'e, E>(exec: E, product_id: ProductId) -> StoreResult<Vec<Price>>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(
        r#"
        SELECT *
        FROM prices
        WHERE product_id = $1
        ORDER BY effective_from DESC, created_at DESC, id DESC
        "#,
    )
    .bind(product_id.as_uuid())
    .fetch_all(exec)
    .await
    .map_err(|e| map_sqlx_error("select_by_product", e))?;

    Span::current().record("row_count", rows.len());

    rows.iter().map(decode).collect()
}

async fn select_active<'e, E>(exec: E, product_id: ProductId) -> StoreResult<Option<Price>>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(
        r#"
        SELECT *
        FROM prices
        WHERE product_id = $1 AND status = 'ACTIVE'
        ORDER BY effective_from DESC, created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(product_id.as_uuid())
    .fetch_optional(exec)
    .await
    .map_err(|e| map_sqlx_error("select_active", e))?;

    row.as_ref().map(decode).transpose()
}

/// Map a SQLx error to a store error, tagged with the failing operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23514") => StoreError::Corrupt(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct PriceRow {
    id: uuid::Uuid,
    product_id: uuid::Uuid,
    amount: Decimal,
    currency: String,
    status: String,
    effective_from: DateTime<Utc>,
    effective_to: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode(row: &PgRow) -> StoreResult<Price> {
    PriceRow::from_row(row)?.try_into()
}

impl PriceRow {
    fn from_row(row: &PgRow) -> StoreResult<Self> {
        let read = || -> Result<Self, sqlx::Error> {
            Ok(PriceRow {
                id: row.try_get("id")?,
                product_id: row.try_get("product_id")?,
                amount: row.try_get("amount")?,
                currency: row.try_get("currency")?,
                status: row.try_get("status")?,
                effective_from: row.try_get("effective_from")?,
                effective_to: row.try_get("effective_to")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })
        };
        read().map_err(|e| StoreError::Corrupt(format!("failed to decode price row: {e}")))
    }
}

impl TryFrom<PriceRow> for Price {
    type Error = StoreError;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| StoreError::Corrupt(format!("price {}: {}", row.id, what));

        let amount = Amount::new(row.amount).map_err(|_| corrupt("amount below minimum"))?;
        let currency: CurrencyCode = row
            .currency
            .parse()
            .map_err(|_| corrupt("unknown currency"))?;
        let status =
            PriceStatus::from_code(&row.status).ok_or_else(|| corrupt("unknown status"))?;

        Ok(Price {
            id: PriceId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            amount,
            currency,
            effective_from: row.effective_from,
            effective_to: row.effective_to,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
