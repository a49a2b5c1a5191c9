use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

pub async fn create_app(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    let router = Router::new()
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/trending", get(handlers::trending))
        .route("/api/search", post(handlers::search))
        .route("/api/news/search", post(handlers::news_search))
        .route("/api/engagement", get(handlers::engagement_stats))
        .route("/api/engagement/logs", get(handlers::chat_logs))
        .route("/api/analytics/topics", get(handlers::topics))
        .route("/api/analytics/twitter", get(handlers::twitter_analytics))
        .route("/api/analytics/enhanced-twitter", get(handlers::enhanced_twitter))
        .route("/api/analytics/network", get(handlers::network))
        .route("/api/analytics/user-tweets", get(handlers::user_tweets))
        .route("/api/analytics/summary", post(handlers::summarize_posts))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route("/health", get(handlers::health));

    let router = match static_dir {
        Some(dir) => {
            tracing::info!("Serving frontend from {}", dir.display());
            let index = dir.join("index.html");
            router.fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(index)))
        }
        None => router.fallback(not_found),
    };

    router
        .layer(middleware::from_fn(auth::page_gate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves the app until ctrl-c.
pub async fn serve(state: AppState, addr: SocketAddr) -> ji_core::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

pub mod prelude {
    pub use crate::auth::{CredentialStore, StaticCredentials, User};
    pub use crate::{create_app, serve, ApiError, AppState};
    pub use ji_core::{Error, Result};
}
