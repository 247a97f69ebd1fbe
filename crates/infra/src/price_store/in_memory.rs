use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use pricing_core::{Clock, PriceId, ProductId, SystemClock};
use pricing_domain::{
    NewPrice, Price, PriceStore, StoreError, StoreResult, TransactionalPriceStore,
};

type Rows = HashMap<PriceId, Price>;

struct Shared {
    rows: RwLock<Rows>,
    /// Held by open transactions and by autocommit writes.
    writer: Arc<tokio::sync::Mutex<()>>,
    clock: Arc<dyn Clock>,
}

/// In-memory price store.
///
/// Intended for tests/dev. Transactions are serialised: `begin` waits until no
/// other transaction is open, so two create/update operations on the same
/// product can never interleave. Reads outside a transaction see committed
/// state only.
///
/// Writes made directly on the store also wait for the writer lock; do not
/// call them while holding a transaction on the same task.
#[derive(Clone)]
pub struct InMemoryPriceStore {
    shared: Arc<Shared>,
}

impl core::fmt::Debug for InMemoryPriceStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let len = self.shared.rows.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("InMemoryPriceStore").field("prices", &len).finish()
    }
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose `created_at`/`updated_at` come from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                rows: RwLock::new(HashMap::new()),
                writer: Arc::new(tokio::sync::Mutex::new(())),
                clock,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_rows<T>(&self, f: impl FnOnce(&Rows) -> T) -> StoreResult<T> {
        let rows = self.shared.rows.read().map_err(|_| poisoned())?;
        Ok(f(&rows))
    }
}

impl Default for InMemoryPriceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceStore for InMemoryPriceStore {
    async fn insert(&self, price: NewPrice) -> StoreResult<Price> {
        let _writer = self.shared.writer.lock().await;
        let mut rows = self.shared.rows.write().map_err(|_| poisoned())?;
        Ok(insert_row(&mut rows, price, self.shared.clock.now()))
    }

    async fn update(&self, price: Price) -> StoreResult<Price> {
        let _writer = self.shared.writer.lock().await;
        let mut rows = self.shared.rows.write().map_err(|_| poisoned())?;
        update_row(&mut rows, price, self.shared.clock.now())
    }

    async fn find_by_id(&self, id: PriceId) -> StoreResult<Option<Price>> {
        self.read_rows(|rows| rows.get(&id).cloned())
    }

    async fn find_by_product(&self, product_id: ProductId) -> StoreResult<Vec<Price>> {
        self.read_rows(|rows| by_product(rows, product_id))
    }

    async fn find_active_by_product(&self, product_id: ProductId) -> StoreResult<Option<Price>> {
        self.read_rows(|rows| active_for(rows, product_id))
    }
}

#[async_trait]
impl TransactionalPriceStore for InMemoryPriceStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> StoreResult<InMemoryTransaction> {
        let guard = self.shared.writer.clone().lock_owned().await;
        let snapshot = self.read_rows(Rows::clone)?;
        Ok(InMemoryTransaction {
            shared: self.shared.clone(),
            staged: Mutex::new(Staged {
                rows: snapshot,
                dirty: HashSet::new(),
            }),
            _writer: guard,
        })
    }

    async fn commit(&self, tx: InMemoryTransaction) -> StoreResult<()> {
        if !Arc::ptr_eq(&self.shared, &tx.shared) {
            return Err(StoreError::Conflict(
                "transaction belongs to a different store".to_string(),
            ));
        }

        // The writer lock is released when the rest of `tx` drops on return.
        let staged = tx.staged.into_inner().map_err(|_| poisoned())?;
        let mut rows = self.shared.rows.write().map_err(|_| poisoned())?;
        for id in staged.dirty {
            if let Some(price) = staged.rows.get(&id) {
                rows.insert(id, price.clone());
            }
        }
        Ok(())
    }
}

struct Staged {
    rows: Rows,
    dirty: HashSet<PriceId>,
}

/// Open transaction on an `InMemoryPriceStore`.
///
/// Works on a private snapshot; dropping it without `commit` discards every write.
pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    staged: Mutex<Staged>,
    _writer: OwnedMutexGuard<()>,
}

impl InMemoryTransaction {
    fn with_staged<T>(&self, f: impl FnOnce(&mut Staged) -> T) -> StoreResult<T> {
        let mut staged = self.staged.lock().map_err(|_| poisoned())?;
        Ok(f(&mut staged))
    }
}

#[async_trait]
impl PriceStore for InMemoryTransaction {
    async fn insert(&self, price: NewPrice) -> StoreResult<Price> {
        let now = self.shared.clock.now();
        self.with_staged(|s| {
            let saved = insert_row(&mut s.rows, price, now);
            s.dirty.insert(saved.id);
            saved
        })
    }

    async fn update(&self, price: Price) -> StoreResult<Price> {
        let now = self.shared.clock.now();
        self.with_staged(|s| {
            let saved = update_row(&mut s.rows, price, now)?;
            s.dirty.insert(saved.id);
            Ok(saved)
        })?
    }

    async fn find_by_id(&self, id: PriceId) -> StoreResult<Option<Price>> {
        self.with_staged(|s| s.rows.get(&id).cloned())
    }

    async fn find_by_product(&self, product_id: ProductId) -> StoreResult<Vec<Price>> {
        self.with_staged(|s| by_product(&s.rows, product_id))
    }

    async fn find_active_by_product(&self, product_id: ProductId) -> StoreResult<Option<Price>> {
        self.with_staged(|s| active_for(&s.rows, product_id))
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory price store lock poisoned".to_string())
}

fn insert_row(rows: &mut Rows, price: NewPrice, now: DateTime<Utc>) -> Price {
    let saved = Price::from_new(PriceId::new(), price, now);
    rows.insert(saved.id, saved.clone());
    saved
}

fn update_row(rows: &mut Rows, mut price: Price, now: DateTime<Utc>) -> StoreResult<Price> {
    let existing = rows.get(&price.id).ok_or(StoreError::Missing(price.id))?;
    // Identity and insert time belong to the store.
    price.product_id = existing.product_id;
    price.created_at = existing.created_at;
    price.updated_at = now;
    rows.insert(price.id, price.clone());
    Ok(price)
}

/// History ordered by `effective_from` desc, newest insert first on ties.
fn by_product(rows: &Rows, product_id: ProductId) -> Vec<Price> {
    let mut prices: Vec<Price> = rows
        .values()
        .filter(|p| p.product_id == product_id)
        .cloned()
        .collect();
    prices.sort_by(|a, b| {
        b.effective_from
            .cmp(&a.effective_from)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
    prices
}

fn active_for(rows: &Rows, product_id: ProductId) -> Option<Price> {
    by_product(rows, product_id).into_iter().find(Price::is_active)
}
