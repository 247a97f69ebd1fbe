//! `pricing-core` — shared building blocks for the pricing service.
//!
//! This crate contains **pure** primitives (no infrastructure concerns):
//! identifiers, the domain error for malformed input and the clock capability.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{PriceId, ProductId};
