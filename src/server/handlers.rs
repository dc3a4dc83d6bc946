use crate::{
    Error, Result,
    identity::client_identifier,
    rate_limit::{RateLimitDecision, RateLimitStatus, SlidingWindowLimiter},
    stability::{GeneratedImage, GenerationRequest, ImageGenerator},
};
use axum::{
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::HeaderMap,
    response::Json,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<SlidingWindowLimiter>,
    pub generator: Arc<dyn ImageGenerator>,
}

pub async fn generate_image(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<GeneratedImage>> {
    let Json(body) = payload.map_err(|rejection| Error::InvalidJson {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    // Validation comes first so bad requests never consume quota.
    let request = GenerationRequest::from_json(&body)?;

    let client = client_identifier(&headers, peer.map(|ConnectInfo(addr)| addr));
    let limiter = &state.limiter;

    let remaining = match limiter.check_and_record(&client, Instant::now()) {
        RateLimitDecision::Admitted { remaining } => remaining,
        RateLimitDecision::Rejected { retry_after } => {
            warn!(
                client = %client,
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded"
            );
            return Err(Error::RateLimited {
                limit: limiter.limit(),
                window_hours: limiter.window_hours(),
                retry_after_ms: retry_after.as_millis() as u64,
            });
        }
    };

    info!(client = %client, remaining, "Generating image");

    // Failures are logged by the generator.
    let image = state.generator.generate(request).await?;
    info!(client = %client, "Image generated");
    Ok(Json(image))
}

pub async fn rate_limit_status(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<RateLimitStatus> {
    let client = client_identifier(&headers, peer.map(|ConnectInfo(addr)| addr));
    Json(state.limiter.status(&client, Instant::now()))
}
