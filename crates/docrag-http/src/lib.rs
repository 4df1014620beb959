//! HTTP surface over [`RagEngine`].

mod error;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use docrag_core::config::ServerSettings;
use docrag_engine::RagEngine;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RagEngine>,
}

pub fn router(engine: Arc<RagEngine>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/rag/index", post(routes::index))
        .route("/rag/query", post(routes::query))
        .route("/rag/stream_query", get(routes::stream_query))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

/// Serves until Ctrl-C.
pub async fn serve(engine: Arc<RagEngine>, settings: &ServerSettings) -> Result<()> {
    let app = router(engine, settings.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
