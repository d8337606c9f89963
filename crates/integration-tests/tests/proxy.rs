//! Forwarding of allowed requests and the health endpoints.

use myevent_integration_tests::{GatewayOptions, TestGateway, from_upstream, location, token};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health() {
    let gw = TestGateway::start().await;

    let resp = gw.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");
    assert!(!from_upstream(&gw.get("/health", None).await));
}

#[tokio::test]
async fn test_readiness_follows_upstream() {
    let gw = TestGateway::start().await;

    let resp = gw.get("/health/ready", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forward_preserves_method_path_query_and_body() {
    let gw = TestGateway::start().await;

    let resp = gw
        .post("/editarEvento/8?draft=1", "titulo=Concierto", Some(&token(2, "user", None)))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(from_upstream(&resp));
    assert_eq!(
        resp.text().await.expect("body"),
        "POST /editarEvento/8?draft=1\ntitulo=Concierto"
    );
}

#[tokio::test]
async fn test_forward_sets_forwarded_host() {
    let gw = TestGateway::start().await;

    let resp = gw.get("/acerca", None).await;
    let seen = resp
        .headers()
        .get("x-seen-forwarded-host")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert_eq!(seen, gw.url.authority());
}

#[tokio::test]
async fn test_redirects_are_not_forwarded() {
    let gw = TestGateway::start().await;

    let resp = gw.get("/perfil", None).await;
    assert_eq!(location(&resp), Some("/login"));
    assert!(!from_upstream(&resp));
}

#[tokio::test]
async fn test_upstream_down_is_bad_gateway() {
    let gw = TestGateway::start_with(GatewayOptions {
        upstream_down: true,
        ..GatewayOptions::default()
    })
    .await;

    let resp = gw.get("/acerca", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(resp.text().await.expect("body"), "Page server unavailable");

    let resp = gw.get("/health/ready", None).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The gate still answers before the proxy is involved
    let resp = gw.get("/misEventos", None).await;
    assert_eq!(location(&resp), Some("/login"));
}
