use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{HeaderMap, Request, StatusCode},
};
use imagegen_relay::{
    config::StabilityConfig,
    rate_limit::SlidingWindowLimiter,
    server::{self, AppState},
    stability::{ImageGenerator, StabilityClient},
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceExt; // for `oneshot`

pub const BODY_LIMIT: usize = 2 * 1024 * 1024;
pub const PEER: &str = "192.0.2.10:40000";

pub fn create_limiter(limit: u32) -> Arc<SlidingWindowLimiter> {
    Arc::new(SlidingWindowLimiter::new(limit, Duration::from_secs(3600)).unwrap())
}

/// Router with a fixed peer address, as if served with connect info.
pub fn create_test_app(
    limiter: Arc<SlidingWindowLimiter>,
    generator: Arc<dyn ImageGenerator>,
) -> Router {
    create_test_app_with_limit(limiter, generator, BODY_LIMIT)
}

pub fn create_test_app_with_limit(
    limiter: Arc<SlidingWindowLimiter>,
    generator: Arc<dyn ImageGenerator>,
    body_limit: usize,
) -> Router {
    let state = AppState { limiter, generator };
    server::router(state, body_limit).layer(MockConnectInfo(PEER.parse::<SocketAddr>().unwrap()))
}

pub fn stability_config(base_url: &str, api_key: Option<&str>) -> StabilityConfig {
    StabilityConfig {
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
        ..StabilityConfig::default()
    }
}

pub fn stability_client(base_url: &str, api_key: Option<&str>) -> StabilityClient {
    StabilityClient::new(stability_config(base_url, api_key)).unwrap()
}

pub fn generate_request(body: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/generate-image")
        .header("content-type", "application/json");
    if let Some(forwarded_for) = forwarded_for {
        builder = builder.header("x-forwarded-for", forwarded_for);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn status_request(forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/rate-limit-status");
    if let Some(forwarded_for) = forwarded_for {
        builder = builder.header("x-forwarded-for", forwarded_for);
    }
    builder.body(Body::empty()).unwrap()
}

/// Sends one request and returns status, headers and the JSON body
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}
