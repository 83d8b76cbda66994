//! Shared helpers for integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response},
    Router,
};
use checkout_shield::config::ShieldConfig;
use checkout_shield::http::server::{build_router, AppState};
use checkout_shield::store::MemoryStore;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const VIEWER_KEY: &str = "test-viewer-key";

pub fn test_config() -> ShieldConfig {
    let mut config = ShieldConfig::default();
    config.admin.api_key = ADMIN_KEY.into();
    config.admin.read_only_keys = vec![VIEWER_KEY.into()];
    config
}

/// Router plus the state behind it, over a fresh store.
pub fn test_app(config: ShieldConfig) -> (Router, AppState) {
    let state = AppState::new(config, Arc::new(MemoryStore::new(None)));
    (build_router(state.clone()), state)
}

pub fn checkout_request(forwarded_for: &str, email: Option<&str>) -> Request<Body> {
    let body = match email {
        Some(email) => format!("billing_email={}", email.replace('@', "%40")),
        None => String::new(),
    };
    Request::builder()
        .method("POST")
        .uri("/checkout")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", forwarded_for)
        .header(header::USER_AGENT, "integration-test/1.0")
        .body(Body::from(body))
        .unwrap()
}

/// A checkout request carrying only the peer address.
pub fn checkout_from_peer(peer: SocketAddr) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/checkout")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub fn admin_get(path: &str, key: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", key))
        .body(Body::empty())
        .unwrap()
}

pub fn admin_post(form: &[(&str, &str)], key: &str) -> Request<Body> {
    let body = form
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri("/admin/actions")
        .header(header::AUTHORIZATION, format!("Bearer {}", key))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn issue_token(app: &Router, action: &str) -> String {
    let response = send(app, admin_get(&format!("/admin/token/{}", action), ADMIN_KEY)).await;
    assert_eq!(response.status(), 200);
    json_body(response).await["token"].as_str().unwrap().to_string()
}
