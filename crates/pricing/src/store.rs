//! Price Store boundary.
//!
//! The domain only depends on these traits; adapters (in-memory, Postgres)
//! live in `pricing-infra`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use pricing_core::{PriceId, ProductId};

use crate::price::{NewPrice, Price};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure reported by a store adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("write conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a `Price`.
    #[error("corrupt price record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Update targeted a record the store does not hold.
    #[error("price record {0} does not exist")]
    Missing(PriceId),
}

/// Persistence collaborator for prices.
///
/// - `insert` assigns the id and sets `created_at`/`updated_at`.
/// - `update` overwrites an existing record and refreshes `updated_at`.
/// - `find_by_product` is ordered by `effective_from` descending.
/// - `find_active_by_product` returns the ACTIVE record; should several exist,
///   the one with the latest `effective_from`.
#[async_trait]
pub trait PriceStore: Send + Sync {
    async fn insert(&self, price: NewPrice) -> StoreResult<Price>;

    async fn update(&self, price: Price) -> StoreResult<Price>;

    async fn find_by_id(&self, id: PriceId) -> StoreResult<Option<Price>>;

    async fn find_by_product(&self, product_id: ProductId) -> StoreResult<Vec<Price>>;

    async fn find_active_by_product(&self, product_id: ProductId) -> StoreResult<Option<Price>>;
}

#[async_trait]
impl<S> PriceStore for Arc<S>
where
    S: PriceStore + ?Sized,
{
    async fn insert(&self, price: NewPrice) -> StoreResult<Price> {
        (**self).insert(price).await
    }

    async fn update(&self, price: Price) -> StoreResult<Price> {
        (**self).update(price).await
    }

    async fn find_by_id(&self, id: PriceId) -> StoreResult<Option<Price>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_product(&self, product_id: ProductId) -> StoreResult<Vec<Price>> {
        (**self).find_by_product(product_id).await
    }

    async fn find_active_by_product(&self, product_id: ProductId) -> StoreResult<Option<Price>> {
        (**self).find_active_by_product(product_id).await
    }
}

/// A store that can group several writes into one all-or-nothing unit.
///
/// The transaction handle is itself a `PriceStore`. Writes become visible on
/// `commit`; dropping the handle discards them.
#[async_trait]
pub trait TransactionalPriceStore: PriceStore {
    type Tx: PriceStore + 'static;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;
}

#[async_trait]
impl<S> TransactionalPriceStore for Arc<S>
where
    S: TransactionalPriceStore + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        (**self).begin().await
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        (**self).commit(tx).await
    }
}
