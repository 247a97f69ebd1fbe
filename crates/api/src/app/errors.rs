use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pricing_domain::PricingError;

pub fn pricing_error_to_response(err: PricingError) -> axum::response::Response {
    match err {
        PricingError::InvalidCurrency(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_currency", err.to_string())
        }
        PricingError::InvalidEffectiveWindow { .. } => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_effective_window",
            err.to_string(),
        ),
        PricingError::InvalidAmount(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
        }
        PricingError::PriceNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "price_not_found", err.to_string())
        }
        PricingError::ActivePriceNotFound(_) => json_error(
            StatusCode::NOT_FOUND,
            "active_price_not_found",
            err.to_string(),
        ),
        PricingError::Store(e) => {
            tracing::error!(error = %e, "price store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage error",
            )
        }
    }
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
