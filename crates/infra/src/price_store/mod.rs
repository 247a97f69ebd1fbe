//! Price Store adapters.
//!
//! Both adapters implement `PriceStore` and `TransactionalPriceStore` from
//! `pricing-domain`:
//! - `InMemoryPriceStore`: tests/dev, transactions are serialised.
//! - `PostgresPriceStore`: sqlx pool, one SQL transaction per handle.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryPriceStore, InMemoryTransaction};
pub use postgres::{PostgresPriceStore, PostgresTransaction};
