//! Process-wide tracing setup for the pricing service.

/// Tracing subscriber installation.
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize tracing/logging using `RUST_LOG` and `PRICING_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(LogFormat::from_env());
}
