//! Router-level tests: auth gate, owner scoping and reminder CRUD over HTTP.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use reminders_api::auth::AppStateInner;
use reminders_db::Database;

const TEST_SECRET: &str = "test-secret-key";

// =============================================================================
// Test Helpers
// =============================================================================

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
    reminders_api::router(AppStateInner::new(db, TEST_SECRET.to_string(), 30))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

fn reminder_body(due: &str) -> Value {
    json!({
        "days_before_due": 2,
        "user_name": "Ada",
        "user_email": "ada@example.com",
        "email_body": "Invoice #42 is due",
        "due_date": due,
    })
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_then_login() {
    let app = app();
    register(&app, "Owner@Example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "owner@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "owner@example.com");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "owner@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "owner@example.com", "password": "another-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn weak_registration_is_rejected() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "owner@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "long-enough-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    register(&app, "owner@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "owner@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reminders_require_a_token() {
    let app = app();
    let (status, _) = send(&app, "GET", "/reminders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/reminders", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/reminders",
        None,
        Some(reminder_body("2024-06-10")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Reminders
// =============================================================================

#[tokio::test]
async fn create_and_list() {
    let app = app();
    let token = register(&app, "owner@example.com").await;

    let (status, created) = send(&app, "POST", "/reminders", Some(&token), Some(reminder_body("2024-06-10"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Pending");
    assert_eq!(created["created_by"], "owner@example.com");
    assert_eq!(created["due_date"], "2024-06-10T00:00:00Z");
    assert_eq!(created["days_before_due"], 2);

    let (status, listed) = send(&app, "GET", "/reminders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0], created);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/reminders/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn non_numeric_lead_time_is_rejected_without_writing() {
    let app = app();
    let token = register(&app, "owner@example.com").await;

    let mut body = reminder_body("2024-06-10");
    body["days_before_due"] = json!("two");
    let (status, error) = send(&app, "POST", "/reminders", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("days_before_due"));

    let (_, listed) = send(&app, "GET", "/reminders", Some(&token), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unparsable_due_date_is_rejected() {
    let app = app();
    let token = register(&app, "owner@example.com").await;

    let (status, _) = send(&app, "POST", "/reminders", Some(&token), Some(reminder_body("next tuesday"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owners_never_see_each_other() {
    let app = app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let (_, a) = send(&app, "POST", "/reminders", Some(&alice), Some(reminder_body("2024-06-10"))).await;
    let (_, b) = send(&app, "POST", "/reminders", Some(&bob), Some(reminder_body("2024-06-11"))).await;

    let (_, for_alice) = send(&app, "GET", "/reminders", Some(&alice), None).await;
    let (_, for_bob) = send(&app, "GET", "/reminders", Some(&bob), None).await;
    assert_eq!(for_alice.as_array().unwrap(), &vec![a.clone()]);
    assert_eq!(for_bob.as_array().unwrap(), &vec![b.clone()]);

    let (status, _) = send(&app, "GET", &format!("/reminders/{}", b["id"]), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_idempotent_and_scoped() {
    let app = app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let (_, a) = send(&app, "POST", "/reminders", Some(&alice), Some(reminder_body("2024-06-10"))).await;
    let (_, b) = send(&app, "POST", "/reminders", Some(&bob), Some(reminder_body("2024-06-10"))).await;

    // Alice cannot remove Bob's reminder.
    let (status, _) = send(&app, "DELETE", &format!("/reminders/{}", b["id"]), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, for_bob) = send(&app, "GET", "/reminders", Some(&bob), None).await;
    assert_eq!(for_bob.as_array().unwrap().len(), 1);

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", &format!("/reminders/{}", a["id"]), Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (_, for_alice) = send(&app, "GET", "/reminders", Some(&alice), None).await;
    assert!(for_alice.as_array().unwrap().is_empty());
}
