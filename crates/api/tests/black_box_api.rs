use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pricing_api::app::services::AppServices;
use pricing_core::{ManualClock, ProductId};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    clock: Arc<ManualClock>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, clock under test control.
        let clock = Arc::new(ManualClock::new(t0()));
        let app = pricing_api::app::build_app(AppServices::in_memory(clock.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            clock,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap()
}

async fn create(
    client: &reqwest::Client,
    srv: &TestServer,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let res = client.post(srv.url("/")).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_then_read_active_price() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = ProductId::new().to_string();

    let (status, created) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "19.99", "currency": "usd" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["currency"], "USD");
    assert_eq!(created["amount"], "19.99");
    assert_eq!(created["productId"], product.as_str());
    assert!(created["effectiveTo"].is_null());
    assert!(created["createdAt"].is_string());

    let res = client
        .get(srv.url(&format!("/product/{product}/active")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let active: serde_json::Value = res.json().await.unwrap();
    assert_eq!(active["id"], created["id"]);
}

#[tokio::test]
async fn second_active_price_expires_the_first() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = ProductId::new().to_string();

    let (_, first) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "10.00", "currency": "EUR" }),
    )
    .await;

    srv.clock.advance(Duration::hours(1));
    let (status, second) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "12.00", "currency": "EUR" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["status"], "ACTIVE");

    let res = client
        .get(srv.url(&format!("/product/{product}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let history: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(history.len(), 2);

    let old = history.iter().find(|p| p["id"] == first["id"]).unwrap();
    assert_eq!(old["status"], "EXPIRED");
    let expired_at: DateTime<Utc> = old["effectiveTo"].as_str().unwrap().parse().unwrap();
    assert_eq!(expired_at, t0() + Duration::hours(1));

    let active_count = history.iter().filter(|p| p["status"] == "ACTIVE").count();
    assert_eq!(active_count, 1);
}

#[tokio::test]
async fn future_price_does_not_replace_active() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = ProductId::new().to_string();

    let (_, current) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "5.00", "currency": "GBP" }),
    )
    .await;

    let (status, future) = create(
        &client,
        &srv,
        json!({
            "productId": product,
            "amount": "6.00",
            "currency": "GBP",
            "effectiveFrom": (t0() + Duration::days(7)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(future["status"], "FUTURE");

    let active: serde_json::Value = client
        .get(srv.url(&format!("/product/{product}/active")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active["id"], current["id"]);
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = ProductId::new().to_string();

    let (status, body) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "1.00", "currency": "XYZ" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_currency");

    let at = (t0() + Duration::days(1)).to_rfc3339();
    let (status, body) = create(
        &client,
        &srv,
        json!({
            "productId": product,
            "amount": "1.00",
            "currency": "USD",
            "effectiveFrom": at,
            "effectiveTo": at,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_effective_window");

    let (status, body) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "0.00", "currency": "USD" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");

    let (status, body) = create(
        &client,
        &srv,
        json!({ "productId": "not-a-uuid", "amount": "1.00", "currency": "USD" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    // Nothing was stored for the product.
    let history: Vec<serde_json::Value> = client
        .get(srv.url(&format!("/product/{product}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let product = ProductId::new().to_string();

    let (_, created) = create(
        &client,
        &srv,
        json!({ "productId": product, "amount": "19.99", "currency": "CAD" }),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    srv.clock.advance(Duration::minutes(5));
    let res = client
        .patch(srv.url(&format!("/{id}")))
        .json(&json!({ "amount": "21.50", "currency": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();

    assert_eq!(updated["amount"], "21.50");
    assert_eq!(updated["currency"], "CAD");
    assert_eq!(updated["status"], "ACTIVE");
    assert_eq!(updated["effectiveFrom"], created["effectiveFrom"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["updatedAt"], created["updatedAt"]);
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .patch(srv.url(&format!("/{}", pricing_core::PriceId::new())))
        .json(&json!({ "amount": "3.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "price_not_found");

    let res = client
        .get(srv.url(&format!("/product/{}/active", ProductId::new())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "active_price_not_found");

    let res = client
        .get(srv.url("/product/nope/active"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
