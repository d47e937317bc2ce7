use crate::config::ServerConfig;
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{api_info, health, images, not_found, subscriptions, tags};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Routes plus the middleware stack.
///
/// `/`, `/health`, `/ready` and `/metrics` are open. Everything under
/// `/api/v1` needs an API key, and handlers read the caller from `X-User-Id`.
/// Only the two routes that carry an image get the upload body limit.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let image_routes = Router::new()
        .route("/api/v1/images", post(images::upload_image))
        .route("/api/v1/images/search", post(images::search_by_image))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes()));

    let api = Router::new()
        .merge(image_routes)
        .route("/api/v1/images/delete", post(images::delete_images))
        .route("/api/v1/thumbnails/lookup", post(images::lookup_thumbnail))
        .route("/api/v1/tags", post(tags::update_tags))
        .route("/api/v1/tags/search", post(tags::search_by_tags))
        .route(
            "/api/v1/subscriptions",
            post(subscriptions::subscribe).get(subscriptions::list_subscriptions),
        )
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    let cors = if state.config.allow_any_origin {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .merge(api)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        // request_id must wrap log_requests so the id is in place when logged.
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM, then flush the record index.
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     server::start_server(server::ServerConfig::load()?).await
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_filter)
        .with_target(false)
        .json()
        .init();

    let addr = config.socket_addr()?;
    let state = Arc::new(ServerState::new(config)?);
    let app = build_router(state.clone());

    tracing::info!(
        %addr,
        api_keys = state.config.api_keys.len(),
        detector = state.pipeline.detector().network_name(),
        rate_limit_per_minute = state.config.rate_limit_per_minute,
        max_upload_mb = state.config.max_upload_mb,
        prometheus = state.prometheus.is_some(),
        "snaptag server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.pipeline.index().flush()?;
    tracing::info!("record index flushed; server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never
/// fires.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "ctrl_c", "shutting down"),
        _ = terminate => tracing::info!(signal = "sigterm", "shutting down"),
    }
}
