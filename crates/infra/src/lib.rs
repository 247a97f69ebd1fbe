//! Infrastructure layer: price store adapters and configuration.

pub mod config;
pub mod price_store;


pub use config::{ConfigError, ServiceConfig, StoreBackend};
pub use price_store::{InMemoryPriceStore, PostgresPriceStore};
