use axum::{
    Router,
    routing::{get, patch, post},
};

pub mod prices;
pub mod system;

/// Price endpoints, mounted at the root.
pub fn router() -> Router {
    Router::new()
        .route("/", post(prices::create_price))
        .route("/:price_id", patch(prices::update_price))
        .route("/product/:product_id", get(prices::list_prices))
        .route("/product/:product_id/active", get(prices::get_active_price))
}
