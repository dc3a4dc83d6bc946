pub mod handlers;
mod types;

pub use handlers::AppState;
pub use types::ErrorResponse;

use crate::{
    Result, config::Config, rate_limit::SlidingWindowLimiter, stability::StabilityClient,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

/// Builds the HTTP routes around `state`.
///
/// Any origin may call the API; there are no cookies or sessions to protect.
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/generate-image", post(handlers::generate_image))
        .route("/rate-limit-status", get(handlers::rate_limit_status))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically forgets clients with nothing left in their window.
pub fn spawn_sweeper(limiter: Arc<SlidingWindowLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.sweep(Instant::now());
            debug!(
                removed,
                tracked = limiter.tracked_identifiers(),
                "Swept idle rate limit entries"
            );
        }
    })
}

pub async fn run(config: Config) -> Result<()> {
    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    )?);
    let generator = StabilityClient::new(config.stability.clone())?;

    info!("Forwarding generation requests to {}", generator.endpoint());

    if config.rate_limit.sweep_interval_secs > 0 {
        spawn_sweeper(
            Arc::clone(&limiter),
            Duration::from_secs(config.rate_limit.sweep_interval_secs),
        );
    }

    let app_state = AppState {
        limiter,
        generator: Arc::new(generator),
    };
    let app = router(app_state, config.server.body_limit_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!(
        "Image relay listening on http://{} (limit {} per {}s)",
        addr, config.rate_limit.max_requests, config.rate_limit.window_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
