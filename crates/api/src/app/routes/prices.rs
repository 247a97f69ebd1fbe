use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use pricing_core::{PriceId, ProductId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_price(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreatePriceRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("product"),
    };

    match services.create_price(body.into_command(product_id)).await {
        Ok(price) => (StatusCode::CREATED, Json(dto::PriceResponse::from(price))).into_response(),
        Err(e) => errors::pricing_error_to_response(e),
    }
}

pub async fn update_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePriceRequest>,
) -> axum::response::Response {
    let price_id: PriceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("price"),
    };

    match services.update_price(price_id, body.into()).await {
        Ok(price) => (StatusCode::OK, Json(dto::PriceResponse::from(price))).into_response(),
        Err(e) => errors::pricing_error_to_response(e),
    }
}

pub async fn list_prices(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("product"),
    };

    match services.list_prices(product_id).await {
        Ok(prices) => {
            let body: Vec<dto::PriceResponse> = prices.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::pricing_error_to_response(e),
    }
}

pub async fn get_active_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("product"),
    };

    match services.get_active_price(product_id).await {
        Ok(price) => (StatusCode::OK, Json(dto::PriceResponse::from(price))).into_response(),
        Err(e) => errors::pricing_error_to_response(e),
    }
}
