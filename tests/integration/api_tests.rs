//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to record a teacher visit and return its id
async fn create_teacher_visit(client: &Client) -> i64 {
    let response = client
        .post(format!("{}/visits/teachers", BASE_URL))
        .json(&json!({
            "name": "Integration Teacher",
            "purpose": "Research",
            "employee_id": "IT-001"
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse create response");
    body["id"].as_i64().expect("No id in response")
}

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
async fn test_student_week_report() {
    let client = Client::new();

    let response = client
        .get(format!("{}/reports/students?range=week", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["stats"]["total"].is_i64());
    assert_eq!(body["dailyTrend"]["labels"].as_array().map(Vec::len), Some(8));
    assert_eq!(body["peakHours"]["values"].as_array().map(Vec::len), Some(24));
    assert!(body["visitors"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_inverted_range_is_rejected() {
    let client = Client::new();

    let response = client
        .get(format!(
            "{}/reports/students?start_date=2024-03-10&end_date=2024-03-05",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore]
async fn test_teacher_exit_only_once() {
    let client = Client::new();
    let id = create_teacher_visit(&client).await;

    let first = client
        .put(format!("{}/visits/teachers/{}/exit", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status().is_success());

    let second = client
        .put(format!("{}/visits/teachers/{}/exit", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status().as_u16(), 409);

    let cleanup = client
        .post(format!("{}/visits/teachers/bulk", BASE_URL))
        .json(&json!({ "action": "delete", "visitor_ids": [id] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(cleanup.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_teacher_summary() {
    let client = Client::new();

    let response = client
        .get(format!("{}/reports/teachers/summary", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["totalVisits"].is_i64());
    assert!(body["uniqueTeachers"].is_i64());
}
