//! Login, logout, and session-check routes: `/api/*`
//!
//! A wrong password is a 200 with `success: false` — the page shows the
//! error inline and the status bar stays quiet. Only the log route
//! treats a missing session as an HTTP error.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::info;

use vipervault_core::session::hash_token;

use crate::cookie;
use crate::error::AppError;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(check_session))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Check the password and establish a session.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    if !password_matches(&body.password, &state.config.password) {
        info!("login rejected");
        return Ok(Json(LoginResponse { success: false }).into_response());
    }

    let token = state.sessions.create().await?;
    let cookie = cookie::session_cookie(
        &token,
        state.config.session_duration_secs,
        state.cookie_secure,
    );

    info!("login accepted");
    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse { success: true }),
    )
        .into_response())
}

/// Destroy the caller's session and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie::session_token(&headers) {
        state.sessions.destroy(&token).await;
    }

    (
        [(SET_COOKIE, cookie::clear_cookie(state.cookie_secure))],
        Json(LoginResponse { success: true }),
    )
        .into_response()
}

/// Report whether the caller holds a valid session.
///
/// Validation bumps the activity timestamp, so an open tab polling this
/// endpoint keeps its session alive.
async fn check_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let authenticated = match cookie::session_token(&headers) {
        Some(token) => state.sessions.validate(&token).await,
        None => false,
    };
    Json(SessionResponse { authenticated })
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Constant-time password comparison.
///
/// Compares SHA-256 digests so inputs of different lengths still take
/// the same time.
fn password_matches(attempt: &str, expected: &str) -> bool {
    let a = hash_token(attempt);
    let b = hash_token(expected);
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
