use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: ji_core::Error,
    },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { source, .. } => source
                .upstream_status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(message) | ApiError::Unauthorized(message) => {
                json!({ "error": message })
            }
            ApiError::Upstream { context, source } => {
                tracing::error!("{}: {}", context, source);
                let mut body = json!({ "error": context, "details": source.to_string() });
                if let ji_core::Error::Search { body: Some(meta), .. } = source {
                    body["meta"] = meta.clone();
                }
                body
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Attaches the facet-level message shown to the client.
pub trait Context<T> {
    fn context(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> Context<T> for ji_core::Result<T> {
    fn context(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Upstream { context, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_passthrough() {
        let err = ApiError::Upstream {
            context: "Failed to fetch dashboard data",
            source: ji_core::Error::Search {
                status: 404,
                reason: "no such index".to_string(),
                body: None,
            },
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::Upstream {
            context: "Failed to fetch topic data",
            source: ji_core::Error::Config("boom".to_string()),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    }
}
