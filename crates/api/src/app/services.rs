//! Service wiring: which store backs the API, and the transaction boundary
//! around each write.

use std::sync::Arc;

use anyhow::Context;

use pricing_core::{Clock, PriceId, ProductId, SystemClock};
use pricing_domain::{
    CreatePrice, Price, PriceLifecycleManager, PricingResult, TransactionalPriceStore, UpdatePrice,
};
use pricing_infra::{InMemoryPriceStore, PostgresPriceStore, StoreBackend};

#[derive(Clone)]
pub enum AppServices {
    InMemory {
        store: InMemoryPriceStore,
        clock: Arc<dyn Clock>,
    },
    Postgres {
        store: PostgresPriceStore,
        clock: Arc<dyn Clock>,
    },
}

pub async fn build_services(backend: &StoreBackend) -> anyhow::Result<AppServices> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match backend {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory price store");
            Ok(AppServices::in_memory(clock))
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresPriceStore::connect(database_url, *max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to apply prices schema")?;
            tracing::info!(max_connections, "using Postgres price store");
            Ok(AppServices::Postgres { store, clock })
        }
    }
}

impl AppServices {
    /// In-memory services driven by `clock` (tests pass a `ManualClock`).
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        AppServices::InMemory {
            store: InMemoryPriceStore::with_clock(clock.clone()),
            clock,
        }
    }

    pub async fn create_price(&self, cmd: CreatePrice) -> PricingResult<Price> {
        match self {
            AppServices::InMemory { store, clock } => create_in_tx(store, clock.clone(), cmd).await,
            AppServices::Postgres { store, clock } => create_in_tx(store, clock.clone(), cmd).await,
        }
    }

    pub async fn update_price(&self, price_id: PriceId, cmd: UpdatePrice) -> PricingResult<Price> {
        match self {
            AppServices::InMemory { store, clock } => {
                update_in_tx(store, clock.clone(), price_id, cmd).await
            }
            AppServices::Postgres { store, clock } => {
                update_in_tx(store, clock.clone(), price_id, cmd).await
            }
        }
    }

    pub async fn get_active_price(&self, product_id: ProductId) -> PricingResult<Price> {
        match self {
            AppServices::InMemory { store, clock } => {
                PriceLifecycleManager::new(store.clone(), clock.clone())
                    .get_active_price(product_id)
                    .await
            }
            AppServices::Postgres { store, clock } => {
                PriceLifecycleManager::new(store.clone(), clock.clone())
                    .get_active_price(product_id)
                    .await
            }
        }
    }

    pub async fn list_prices(&self, product_id: ProductId) -> PricingResult<Vec<Price>> {
        match self {
            AppServices::InMemory { store, clock } => {
                PriceLifecycleManager::new(store.clone(), clock.clone())
                    .list_prices(product_id)
                    .await
            }
            AppServices::Postgres { store, clock } => {
                PriceLifecycleManager::new(store.clone(), clock.clone())
                    .list_prices(product_id)
                    .await
            }
        }
    }
}

// The price write and any deactivation writes commit together or not at all.

async fn create_in_tx<S>(store: &S, clock: Arc<dyn Clock>, cmd: CreatePrice) -> PricingResult<Price>
where
    S: TransactionalPriceStore,
{
    let tx = store.begin().await?;
    let manager = PriceLifecycleManager::new(tx, clock);
    let price = manager.create(cmd).await?;
    store.commit(manager.into_store()).await?;
    Ok(price)
}

async fn update_in_tx<S>(
    store: &S,
    clock: Arc<dyn Clock>,
    price_id: PriceId,
    cmd: UpdatePrice,
) -> PricingResult<Price>
where
    S: TransactionalPriceStore,
{
    let tx = store.begin().await?;
    let manager = PriceLifecycleManager::new(tx, clock);
    let price = manager.update(price_id, cmd).await?;
    store.commit(manager.into_store()).await?;
    Ok(price)
}
