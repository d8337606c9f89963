//! `GET /api/session` through the full stack.

use myevent_integration_tests::{BackendMode, GatewayOptions, TestGateway, token};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn session_json(gw: &TestGateway, token: Option<&str>) -> Value {
    let resp = gw.get("/api/session", token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse session JSON")
}

#[tokio::test]
async fn test_guest_session() {
    let gw = TestGateway::start().await;

    let body = session_json(&gw, None).await;
    assert_eq!(
        body,
        json!({"user": null, "isAuthenticated": false, "nav": "guest"})
    );
}

#[tokio::test]
async fn test_user_session() {
    let gw = TestGateway::start().await;
    let raw = token(5, "user", Some("marta"));

    let body = session_json(&gw, Some(&raw)).await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["nav"], "user");
    assert_eq!(body["user"]["usuario_id"], 5);
    assert_eq!(body["user"]["apodo"], "marta");
    assert_eq!(body["user"]["rol"], "user");
    assert!(!body.to_string().contains(&raw));
}

#[tokio::test]
async fn test_admin_session() {
    let gw = TestGateway::start().await;

    let body = session_json(&gw, Some(&token(1, "admin", None))).await;
    assert_eq!(body["nav"], "admin");
    assert!(body["user"].get("apodo").is_none());
}

#[tokio::test]
async fn test_session_endpoint_is_public() {
    // The endpoint is informational; it never calls the backend.
    let gw = TestGateway::start_with(GatewayOptions {
        backend: BackendMode::Inactive,
        ..GatewayOptions::default()
    })
    .await;

    let body = session_json(&gw, Some(&token(5, "user", None))).await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(gw.backend.calls(), 0);
}

#[tokio::test]
async fn test_undecodable_cookie_is_guest() {
    let gw = TestGateway::start().await;

    let body = session_json(&gw, Some("not.a.token")).await;
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["nav"], "guest");
}
