use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
    pub search: String,
}

/// Liveness plus a ping of the search backend; 503 while the backend is unreachable.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let backend = state.backend.name().to_string();
    match state.backend.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                backend,
                search: "up".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!("search backend {} unreachable: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    backend,
                    search: e.to_string(),
                }),
            )
        }
    }
}
