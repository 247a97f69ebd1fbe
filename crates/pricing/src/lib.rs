//! Pricing domain module.
//!
//! This crate contains the business rules for product prices: status
//! resolution from effective windows and the single-active-price rule,
//! implemented against an abstract store (no HTTP, no SQL).

pub mod error;
pub mod manager;
pub mod price;
pub mod store;

pub use error::{PricingError, PricingResult};
pub use manager::{CreatePrice, PriceLifecycleManager, UpdatePrice};
pub use price::{Amount, CurrencyCode, EffectiveWindow, NewPrice, Price, PriceStatus};
pub use store::{PriceStore, StoreError, StoreResult, TransactionalPriceStore};
