//! Demo authentication: one configured credential pair, a flag cookie, and a
//! path-prefix gate in front of the dashboard pages.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use ji_core::config::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

pub const AUTH_COOKIE: &str = "isAuthenticated";
pub const USER_COOKIE: &str = "username";
pub const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
pub const PROTECTED_PREFIXES: [&str; 3] = ["/dashboard", "/analytics", "/citizen-engagement"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the user when the pair is valid.
    async fn verify(&self, username: &str, password: &str) -> Option<User>;

    /// Resolves a previously authenticated username.
    async fn lookup(&self, username: &str) -> Option<User>;
}

/// A single account taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    config: AuthConfig,
}

impl StaticCredentials {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    fn user(&self) -> User {
        User {
            username: self.config.username.clone(),
            role: self.config.role.clone(),
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Option<User> {
        (username == self.config.username && password == self.config.password).then(|| self.user())
    }

    async fn lookup(&self, username: &str) -> Option<User> {
        (username == self.config.username).then(|| self.user())
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn is_authenticated(headers: &HeaderMap) -> bool {
    cookie_value(headers, AUTH_COOKIE) == Some("true")
}

fn set_cookie(name: &str, value: &str, max_age: u64) -> (axum::http::HeaderName, HeaderValue) {
    let cookie = format!("{}={}; Path=/; Max-Age={}; SameSite=Lax", name, value, max_age);
    let value = HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""));
    (SET_COOKIE, value)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    let user = state
        .credentials
        .verify(&request.username, &request.password)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    tracing::info!("User {} logged in", user.username);
    let headers = AppendHeaders([
        set_cookie(AUTH_COOKIE, "true", SESSION_MAX_AGE_SECS),
        set_cookie(USER_COOKIE, &user.username, SESSION_MAX_AGE_SECS),
    ]);
    let body = SessionResponse {
        is_authenticated: true,
        user: Some(user),
    };
    Ok((headers, Json(body)).into_response())
}

pub async fn logout() -> impl IntoResponse {
    let headers = AppendHeaders([set_cookie(AUTH_COOKIE, "", 0), set_cookie(USER_COOKIE, "", 0)]);
    (
        headers,
        Json(SessionResponse {
            is_authenticated: false,
            user: None,
        }),
    )
}

pub async fn session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<SessionResponse> {
    if !is_authenticated(&headers) {
        return Json(SessionResponse {
            is_authenticated: false,
            user: None,
        });
    }
    let user = match cookie_value(&headers, USER_COOKIE) {
        Some(username) => state.credentials.lookup(username).await,
        None => None,
    };
    Json(SessionResponse {
        is_authenticated: user.is_some(),
        user,
    })
}

/// Sends anonymous visitors of dashboard pages to `/login`, and signed-in
/// visitors of `/login` to `/dashboard`.
pub async fn page_gate(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let authenticated = is_authenticated(request.headers());

    if !authenticated && PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        tracing::debug!("Redirecting anonymous request for {} to /login", path);
        return Redirect::temporary("/login").into_response();
    }
    if authenticated && path.starts_with("/login") {
        return Redirect::temporary("/dashboard").into_response();
    }
    next.run(request).await
}
