//! API integration tests (need a running server and database)

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_effective_stock_for_unknown_equipment() {
    let client = Client::new();
    let id = uuid::Uuid::new_v4();

    let response = client
        .post(format!("{}/inventory/effective-stock", BASE_URL))
        .json(&json!({
            "equipment_ids": [id],
            "start_date": "2025-06-01",
            "end_date": "2025-06-03"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["stock"].as_array().expect("No stock list").is_empty());
    let unknown = body["unknown"].as_array().expect("No unknown list");
    assert_eq!(unknown.len(), 3);
    assert_eq!(unknown[0]["cause"], "equipment_missing");
}

#[tokio::test]
#[ignore]
async fn test_effective_stock_rejects_inverted_range() {
    let client = Client::new();

    let response = client
        .post(format!("{}/inventory/effective-stock", BASE_URL))
        .json(&json!({
            "equipment_ids": [uuid::Uuid::new_v4()],
            "start_date": "2025-06-03",
            "end_date": "2025-06-01"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_conflicts_over_range() {
    let client = Client::new();

    let response = client
        .post(format!("{}/inventory/conflicts", BASE_URL))
        .json(&json!({
            "start_date": "2025-06-01",
            "end_date": "2025-06-30"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["conflicts"].is_array());
    assert!(body["unknown"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_conflicts_require_dates() {
    let client = Client::new();

    let response = client
        .post(format!("{}/inventory/conflicts", BASE_URL))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_suggestions() {
    let client = Client::new();

    let response = client
        .get(format!(
            "{}/inventory/suggestions?start_date=2025-06-01&end_date=2025-06-30",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_availability_of_missing_equipment() {
    let client = Client::new();

    let response = client
        .get(format!(
            "{}/inventory/equipment/{}/availability?date=2025-06-02",
            BASE_URL,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_overbooked_rejects_negative_usage() {
    let client = Client::new();

    let response = client
        .get(format!(
            "{}/inventory/equipment/{}/overbooked?date=2025-06-02&additional_usage=-1",
            BASE_URL,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_invalidate() {
    let client = Client::new();

    let response = client
        .post(format!("{}/inventory/invalidate", BASE_URL))
        .json(&json!({ "scope": "bookings" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 204);
}
