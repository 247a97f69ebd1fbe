use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pricing_core::{PriceId, ProductId};

use crate::error::{PricingError, PricingResult};

/// Lifecycle status of a price, derived from its effective window.
///
/// Never set directly by callers: the lifecycle manager recomputes it on every
/// write. Once stored it is a snapshot and does not follow the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceStatus {
    Active,
    Future,
    Expired,
}

impl PriceStatus {
    /// Status Resolution rule.
    ///
    /// `effective_from == now` is not FUTURE; `effective_to == now` is EXPIRED.
    pub fn resolve(
        effective_from: DateTime<Utc>,
        effective_to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if effective_from > now {
            return PriceStatus::Future;
        }
        match effective_to {
            Some(to) if to <= now => PriceStatus::Expired,
            _ => PriceStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceStatus::Active => "ACTIVE",
            PriceStatus::Future => "FUTURE",
            PriceStatus::Expired => "EXPIRED",
        }
    }

    /// Parse the stored (uppercase) representation.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ACTIVE" => Some(PriceStatus::Active),
            "FUTURE" => Some(PriceStatus::Future),
            "EXPIRED" => Some(PriceStatus::Expired),
            _ => None,
        }
    }
}

impl core::fmt::Display for PriceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Cad,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 4] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Cad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Cad => "CAD",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = PricingError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        CurrencyCode::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| PricingError::InvalidCurrency(s.to_string()))
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monetary amount, at least `0.01`. Arbitrary precision, never floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Smallest accepted amount (one cent).
    pub const MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

    pub fn new(value: Decimal) -> PricingResult<Self> {
        if value < Self::MIN {
            return Err(PricingError::InvalidAmount(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PricingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Validated `[from, to)` effective window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveWindow {
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
}

impl EffectiveWindow {
    /// `to`, when present, must be strictly after `from`.
    pub fn new(from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> PricingResult<Self> {
        if let Some(to) = to {
            if to <= from {
                return Err(PricingError::InvalidEffectiveWindow { from, to });
            }
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> Option<DateTime<Utc>> {
        self.to
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PriceStatus {
        PriceStatus::resolve(self.from, self.to, now)
    }
}

/// A price that has not been persisted yet (no id, no store timestamps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrice {
    pub product_id: ProductId,
    pub amount: Amount,
    pub currency: CurrencyCode,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub status: PriceStatus,
}

/// A persisted price record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    pub product_id: ProductId,
    pub amount: Amount,
    pub currency: CurrencyCode,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub status: PriceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Price {
    /// Materialize a stored record from a pending one.
    ///
    /// Intended for store adapters: the id and timestamps are theirs to assign.
    pub fn from_new(id: PriceId, new: NewPrice, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id: new.product_id,
            amount: new.amount,
            currency: new.currency,
            effective_from: new.effective_from,
            effective_to: new.effective_to,
            status: new.status,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PriceStatus::Active
    }

    /// Close the window at `at` and mark the price expired.
    pub(crate) fn expire_at(&mut self, at: DateTime<Utc>) {
        self.status = PriceStatus::Expired;
        self.effective_to = Some(at);
    }
}
