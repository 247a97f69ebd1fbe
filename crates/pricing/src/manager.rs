//! Price lifecycle manager: status resolution plus the single-active-price rule.
//!
//! Each operation is a short read/write sequence against one `PriceStore`.
//! Atomicity across the writes of one operation is the store's job: callers
//! hand the manager a transaction handle and commit it afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use pricing_core::{Clock, PriceId, ProductId};

use crate::error::{PricingError, PricingResult};
use crate::price::{Amount, CurrencyCode, EffectiveWindow, NewPrice, Price, PriceStatus};
use crate::store::PriceStore;

/// Input for `PriceLifecycleManager::create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrice {
    pub product_id: ProductId,
    pub amount: Decimal,
    pub currency: String,
    /// Defaults to the current time.
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

/// Partial input for `PriceLifecycleManager::update`. `None` keeps the stored value.
///
/// `effective_to` cannot be cleared through an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePrice {
    pub amount: Option<Decimal>,
    /// Blank strings count as omitted.
    pub currency: Option<String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PriceLifecycleManager<S, C> {
    store: S,
    clock: C,
}

impl<S, C> PriceLifecycleManager<S, C>
where
    S: PriceStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back (e.g. to commit a transaction handle).
    pub fn into_store(self) -> S {
        self.store
    }

    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id), err)]
    pub async fn create(&self, cmd: CreatePrice) -> PricingResult<Price> {
        let now = self.clock.now();

        let amount = Amount::new(cmd.amount)?;
        let currency: CurrencyCode = cmd.currency.parse()?;
        let window = EffectiveWindow::new(cmd.effective_from.unwrap_or(now), cmd.effective_to)?;

        let saved = self
            .store
            .insert(NewPrice {
                product_id: cmd.product_id,
                amount,
                currency,
                effective_from: window.from(),
                effective_to: window.to(),
                status: window.status_at(now),
            })
            .await?;

        info!(price_id = %saved.id, status = %saved.status, "price created");

        if saved.is_active() {
            self.deactivate_existing_active(saved.product_id, saved.id, now)
                .await?;
        }

        Ok(saved)
    }

    #[instrument(skip(self, cmd), fields(price_id = %price_id), err)]
    pub async fn update(&self, price_id: PriceId, cmd: UpdatePrice) -> PricingResult<Price> {
        let now = self.clock.now();

        let mut price = self
            .store
            .find_by_id(price_id)
            .await?
            .ok_or(PricingError::PriceNotFound(price_id))?;

        if let Some(amount) = cmd.amount {
            price.amount = Amount::new(amount)?;
        }
        if let Some(currency) = cmd.currency.as_deref().filter(|c| !c.trim().is_empty()) {
            price.currency = currency.parse()?;
        }

        let window = EffectiveWindow::new(
            cmd.effective_from.unwrap_or(price.effective_from),
            cmd.effective_to.or(price.effective_to),
        )?;
        price.effective_from = window.from();
        price.effective_to = window.to();
        price.status = window.status_at(now);

        let saved = self.store.update(price).await?;

        info!(product_id = %saved.product_id, status = %saved.status, "price updated");

        if saved.is_active() {
            self.deactivate_existing_active(saved.product_id, saved.id, now)
                .await?;
        }

        Ok(saved)
    }

    /// The stored ACTIVE price. Status is not re-resolved against the clock.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn get_active_price(&self, product_id: ProductId) -> PricingResult<Price> {
        self.store
            .find_active_by_product(product_id)
            .await?
            .ok_or(PricingError::ActivePriceNotFound(product_id))
    }

    /// Full history, most recent `effective_from` first. Empty is not an error.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn list_prices(&self, product_id: ProductId) -> PricingResult<Vec<Price>> {
        Ok(self.store.find_by_product(product_id).await?)
    }

    /// Expire every ACTIVE price of the product other than `exclude`.
    ///
    /// Scans the whole history rather than asking for "the" active price: right
    /// after the new price is written there are two, and the store may return
    /// either.
    async fn deactivate_existing_active(
        &self,
        product_id: ProductId,
        exclude: PriceId,
        now: DateTime<Utc>,
    ) -> PricingResult<Vec<Price>> {
        let previous: Vec<Price> = self
            .store
            .find_by_product(product_id)
            .await?
            .into_iter()
            .filter(|p| p.status == PriceStatus::Active && p.id != exclude)
            .collect();

        let mut expired = Vec::with_capacity(previous.len());
        for mut price in previous {
            price.expire_at(now);
            let saved = self.store.update(price).await?;
            info!(
                product_id = %product_id,
                expired_price_id = %saved.id,
                replaced_by = %exclude,
                "previously active price expired"
            );
            expired.push(saved);
        }

        Ok(expired)
    }
}
