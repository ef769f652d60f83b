//! Session authentication middleware.
//!
//! Extracts the `session_token` cookie, validates it against the session
//! store (which bumps the activity timestamp), and lets the request
//! through. Applied only to routes that expose command output — login,
//! logout, session check, and the page itself stay public.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::cookie;
use crate::state::AppState;

/// Middleware that requires a valid session cookie.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let token = cookie::session_token(req.headers());

    let valid = match &token {
        Some(token) => state.sessions.validate(token).await,
        None => false,
    };

    if valid {
        next.run(req).await
    } else {
        // Plain text: the page drops this straight into the output pane.
        (
            StatusCode::UNAUTHORIZED,
            "Unauthorized: Invalid or expired session.",
        )
            .into_response()
    }
}
