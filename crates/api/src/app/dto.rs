use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pricing_core::ProductId;
use pricing_domain::{CreatePrice, CurrencyCode, Price, PriceStatus, UpdatePrice};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePriceRequest {
    pub product_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl CreatePriceRequest {
    pub fn into_command(self, product_id: ProductId) -> CreatePrice {
        CreatePrice {
            product_id,
            amount: self.amount,
            currency: self.currency,
            effective_from: self.effective_from,
            effective_to: self.effective_to,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceRequest {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl From<UpdatePriceRequest> for UpdatePrice {
    fn from(body: UpdatePriceRequest) -> Self {
        UpdatePrice {
            amount: body.amount,
            currency: body.currency,
            effective_from: body.effective_from,
            effective_to: body.effective_to,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub id: String,
    pub product_id: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub status: PriceStatus,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Price> for PriceResponse {
    fn from(p: Price) -> Self {
        Self {
            id: p.id.to_string(),
            product_id: p.product_id.to_string(),
            amount: p.amount.value(),
            currency: p.currency,
            status: p.status,
            effective_from: p.effective_from,
            effective_to: p.effective_to,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
