//! Route definitions and router construction.
//!
//! # Path Parameter Syntax
//! Axum 0.8 uses brace syntax for path parameters: `{name}`

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Prefix existing `llamafile_manager` clients call.
pub const API_PREFIX: &str = "/api/llamafile_manager";

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Artifact API routes, without the prefix (for nesting under [`API_PREFIX`]).
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Artifacts
        .route("/list_llamafiles", get(handlers::artifacts::list))
        .route("/has_llamafile/{name}", get(handlers::artifacts::has))
        // Downloads
        .route("/download_llamafile", post(handlers::downloads::download))
        .route("/download_progress", post(handlers::downloads::progress))
        .route("/downloads", get(handlers::downloads::list))
        .route("/downloads/{name}", get(handlers::downloads::status))
        // Runs
        .route("/run_llamafile", post(handlers::runs::run))
        .route("/is_llamafile_running", post(handlers::runs::is_running))
        .route("/stop_llamafile", post(handlers::runs::stop))
        .route("/runs", get(handlers::runs::list))
}

fn build(ctx: AxumContext, cors_config: &CorsConfig, static_dir: Option<&Path>) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, api_routes().with_state(state).layer(cors));

    if let Some(dir) = static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http())
}

/// Create the main Axum router with the health check and the artifact API.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    build(ctx, cors_config, None)
}

/// Like [`create_router`], also serving `static_dir` under `/static`.
pub fn create_static_router<P: AsRef<Path>>(
    ctx: AxumContext,
    static_dir: P,
    cors_config: &CorsConfig,
) -> Router {
    build(ctx, cors_config, Some(static_dir.as_ref()))
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
