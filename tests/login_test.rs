mod common;

use common::setup_test_app;
use serde_json::json;

async fn register(app: &common::TestApp, email: &str, password: &str) {
    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": email,
            "password": password,
            "display_name": "Tester",
        }))
        .send()
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn login_returns_token_pair() {
    let app = setup_test_app().await;
    register(&app, "login@example.com", "correct horse battery staple").await;

    let response = app
        .post("/api/v1/auth/login")
        .json(&json!({
            "email": "login@example.com",
            "password": "correct horse battery staple",
            "device_id": "device-1",
        }))
        .send()
        .await;

    assert_eq!(response.status(), 200);
    let body = response.value().await;
    assert!(body["access_token"].as_str().unwrap().len() > 0);
    assert!(body["refresh_token"].as_str().unwrap().len() > 0);
    assert_eq!(body["user"]["email"], "login@example.com");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = setup_test_app().await;
    register(&app, "wrongpass@example.com", "correct horse battery staple").await;

    let response = app
        .post("/api/v1/auth/login")
        .json(&json!({
            "email": "wrongpass@example.com",
            "password": "not the right password",
            "device_id": "device-1",
        }))
        .send()
        .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn login_rejects_unknown_email_without_revealing_existence() {
    let app = setup_test_app().await;

    let response = app
        .post("/api/v1/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": "correct horse battery staple",
            "device_id": "device-1",
        }))
        .send()
        .await;

    assert_eq!(response.status(), 401);
    let body = response.value().await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn access_token_authorizes_protected_routes() {
    let app = setup_test_app().await;
    register(&app, "protected@example.com", "correct horse battery staple").await;

    let login = app
        .post("/api/v1/auth/login")
        .json(&json!({
            "email": "protected@example.com",
            "password": "correct horse battery staple",
            "device_id": "device-1",
        }))
        .send()
        .await
        .value()
        .await;

    let access_token = login["access_token"].as_str().unwrap();

    let response = app
        .get("/api/v1/notes")
        .bearer(access_token)
        .send()
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let app = setup_test_app().await;
    let response = app.get("/api/v1/notes").send().await;
    assert_eq!(response.status(), 401);
}
