//! Pricing error model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use pricing_core::{PriceId, ProductId};

use crate::store::StoreError;

/// Result type used across the pricing domain.
pub type PricingResult<T> = Result<T, PricingError>;

/// Failures surfaced by the price lifecycle manager.
///
/// Every variant is reported to the caller as-is; none is retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("unsupported currency: {0}")]
    InvalidCurrency(String),

    #[error("effective_to ({to}) must be after effective_from ({from})")]
    InvalidEffectiveWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("amount must be at least 0.01 (got {0})")]
    InvalidAmount(Decimal),

    #[error("price not found: {0}")]
    PriceNotFound(PriceId),

    #[error("active price not found for product {0}")]
    ActivePriceNotFound(ProductId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PricingError {
    /// True for failures caused by the request itself (as opposed to lookups or storage).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidCurrency(_)
                | PricingError::InvalidEffectiveWindow { .. }
                | PricingError::InvalidAmount(_)
        )
    }
}
