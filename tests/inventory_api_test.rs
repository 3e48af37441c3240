mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{TestApp, SEEDED_SKUS};

async fn default_row(app: &TestApp, sku: &str) -> Value {
    let (status, body) = app.get(&format!("/api/v1/inventory/lookup?sku={sku}")).await;
    assert_eq!(status, StatusCode::OK, "lookup {sku}: {body}");
    body
}

#[tokio::test]
async fn inventory_row_lifecycle() {
    let app = TestApp::new().await;

    let (status, created) = app
        .post(
            "/api/v1/inventory",
            json!({
                "product_sku": "WAFFLE-001",
                "warehouse_id": 2,
                "quantity_available": 8,
                "reorder_point": 10
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"], 0);
    assert_eq!(created["warehouse_id"], 2);
    assert_eq!(created["stock_status"], "low_stock");
    assert_eq!(created["total_quantity"], 8);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = app.get(&format!("/api/v1/inventory/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["product_sku"], "WAFFLE-001");

    let (status, updated) = app
        .patch(
            &format!("/api/v1/inventory/{id}/quantities"),
            json!({ "version": 0, "quantity_available": 30, "quantity_reserved": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], 1);
    assert_eq!(updated["quantity_available"], 30);
    assert_eq!(updated["total_quantity"], 34);
    assert_eq!(updated["stock_status"], "in_stock");

    let (status, summary) = app.get("/api/v1/inventory/products/WAFFLE-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_available"], 80);
    assert_eq!(summary["total_reserved"], 4);
    assert_eq!(summary["locations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn total_quantity_does_not_wrap_at_i32_max() {
    let app = TestApp::new().await;

    let (status, created) = app
        .post(
            "/api/v1/inventory",
            json!({
                "product_sku": "PIE-001",
                "warehouse_id": 5,
                "quantity_available": i32::MAX,
                "quantity_reserved": 1
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["total_quantity"], i64::from(i32::MAX) + 1);
    assert_eq!(created["stock_status"], "in_stock");
}

#[tokio::test]
async fn stale_version_returns_conflict() {
    let app = TestApp::new().await;
    let row = default_row(&app, "CREME-001").await;
    let id = row["id"].as_i64().unwrap();
    let uri = format!("/api/v1/inventory/{id}/quantities");

    let (status, _) = app
        .patch(&uri, json!({ "version": 0, "quantity_sold": 3 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .patch(&uri, json!({ "version": 0, "quantity_sold": 7 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (_, current) = app.get(&format!("/api/v1/inventory/{id}")).await;
    assert_eq!(current["quantity_sold"], 3);
    assert_eq!(current["version"], 1);
}

#[tokio::test]
async fn invalid_quantity_updates_are_rejected() {
    let app = TestApp::new().await;
    let row = default_row(&app, "PIE-001").await;
    let uri = format!("/api/v1/inventory/{}/quantities", row["id"]);

    let (status, _) = app
        .patch(&uri, json!({ "version": 0, "quantity_available": -5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.patch(&uri, json!({ "version": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reserve_moves_stock_and_rejects_overdraw() {
    let app = TestApp::new().await;
    let row = default_row(&app, "CAKE-001").await;
    let uri = format!("/api/v1/inventory/{}/reserve", row["id"]);

    let (status, body) = app.post(&uri, json!({ "quantity": 45 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_available"], 5);
    assert_eq!(body["quantity_reserved"], 45);
    assert_eq!(body["stock_status"], "low_stock");

    let (status, body) = app.post(&uri, json!({ "quantity": 6 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("CAKE-001"));

    let (status, _) = app.post(&uri, json!({ "quantity": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/inventory/999999/reserve", json!({ "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_duplicates_and_unknown_products() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post("/api/v1/inventory", json!({ "product_sku": "PIE-001" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/v1/inventory",
            json!({ "product_sku": "GHOST-001", "warehouse_id": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lookup_distinguishes_default_warehouse() {
    let app = TestApp::new().await;

    app.post(
        "/api/v1/inventory",
        json!({ "product_sku": "BROWNIE-001", "warehouse_id": 4, "quantity_available": 3 }),
    )
    .await;

    let default = default_row(&app, "BROWNIE-001").await;
    assert_eq!(default["warehouse_id"], Value::Null);
    assert_eq!(default["quantity_available"], 50);

    let (status, north) = app
        .get("/api/v1/inventory/lookup?sku=BROWNIE-001&warehouse_id=4")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(north["quantity_available"], 3);

    let (status, _) = app
        .get("/api/v1/inventory/lookup?sku=BROWNIE-001&warehouse_id=5")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/inventory/lookup?sku=NOPE-001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/inventory/products/NOPE-001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_warehouse_and_status() {
    let app = TestApp::new().await;

    app.post(
        "/api/v1/inventory",
        json!({ "product_sku": "PANNA-001", "warehouse_id": 9, "quantity_available": 0, "reorder_point": 5 }),
    )
    .await;

    let (status, body) = app.get("/api/v1/inventory?limit=100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 10);

    let (_, body) = app.get("/api/v1/inventory?warehouse_id=null&limit=100").await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), SEEDED_SKUS.len());
    assert!(items.iter().all(|row| row["warehouse_id"].is_null()));

    let (_, body) = app.get("/api/v1/inventory?warehouse_id=9").await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/v1/inventory?stock_status=out_of_stock").await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_sku"], "PANNA-001");

    let (_, body) = app.get("/api/v1/inventory?key=Panna").await;
    assert_eq!(body["pagination"]["total"], 2);

    let (status, _) = app.get("/api/v1/inventory?warehouse_id=north").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_update_reports_skipped_keys() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/inventory/bulk",
            json!({
                "updates": [
                    { "product_sku": "WAFFLE-001", "quantity_available": 0 },
                    { "product_sku": "CREME-001", "quantity_available": 7 },
                    { "product_sku": "CREME-001", "warehouse_id": 99, "quantity_available": 7 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);
    assert_eq!(
        body["skipped"],
        json!([{ "product_sku": "CREME-001", "warehouse_id": 99 }])
    );

    let (_, out) = app.get("/api/v1/inventory/out-of-stock").await;
    let out = out.as_array().unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["product_sku"], "WAFFLE-001");

    let (_, low) = app.get("/api/v1/inventory/low-stock").await;
    assert_eq!(low.as_array().unwrap().len(), 2);

    let (_, stats) = app.get("/api/v1/inventory/stats").await;
    assert_eq!(stats["total_records"], 9);
    assert_eq!(stats["total_available"], 50 * 7 + 7);
    assert_eq!(stats["out_of_stock_count"], 1);
    assert_eq!(stats["low_stock_count"], 1);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");

    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pong");
}
