mod common;

use common::setup_test_app;
use serde_json::json;

#[tokio::test]
async fn register_returns_created_user() {
    let app = setup_test_app().await;

    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "Alice@Example.com",
            "password": "correct horse battery staple",
            "display_name": "Alice",
        }))
        .send()
        .await;

    assert_eq!(response.status(), 201);
    let body = response.value().await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["display_name"], "Alice");
    assert!(body["password_hash"].is_null());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = setup_test_app().await;

    let payload = json!({
        "email": "dup@example.com",
        "password": "correct horse battery staple",
        "display_name": "Dup",
    });

    let first = app.post("/api/v1/auth/register").json(&payload).send().await;
    assert_eq!(first.status(), 201);

    let second = app.post("/api/v1/auth/register").json(&payload).send().await;
    assert_eq!(second.status(), 409);
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = setup_test_app().await;

    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "short@example.com",
            "password": "short",
            "display_name": "Shorty",
        }))
        .send()
        .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn register_rejects_unknown_fields() {
    let app = setup_test_app().await;

    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "extra@example.com",
            "password": "correct horse battery staple",
            "display_name": "Extra",
            "is_admin": true,
        }))
        .send()
        .await;

    assert_eq!(response.status(), 400);
}
