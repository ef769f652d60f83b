//! Log output route: `/api/log`
//!
//! Runs the selected view's configured command and returns the output
//! as plain text. The session middleware guards this router — it is the
//! only surface that reaches the shell.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tracing::debug;

use vipervault_core::escape::escape_html;

use crate::error::AppError;
use crate::state::AppState;

/// Build the log router (mounted behind the session middleware).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/log", get(get_log))
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub view: Option<String>,
}

/// Run the selected view's command and return its output.
async fn get_log(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Result<Response, AppError> {
    let Some(view) = query.view.as_deref().and_then(|name| state.config.view(name))
    else {
        return Ok((
            StatusCode::NOT_FOUND,
            "Invalid or missing log view selection.",
        )
            .into_response());
    };

    debug!(view = query.view.as_deref().unwrap_or(""), "running view command");
    let raw = state.runner.run(&view.cmd).await?;

    let output = if view.safe_output {
        escape_html(&raw)
    } else {
        raw
    };

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        output,
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "password": "pw",
        "log_views": {
            "greet": "echo '<hello>'",
            "raw": {"cmd": "echo '<hello>'", "safe_output": false},
            "broken": "exit 7"
        }
    }"#;

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn fetch(state: Arc<AppState>, view: Option<&str>) -> Response {
        get_log(
            State(state),
            Query(LogQuery {
                view: view.map(str::to_owned),
            }),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn escaped_view_escapes_output() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let resp = fetch(state, Some("greet")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(resp).await, "&lt;hello&gt;\n");
    }

    #[tokio::test]
    async fn unsafe_view_returns_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let resp = fetch(state, Some("raw")).await;
        assert_eq!(body_text(resp).await, "<hello>\n");
    }

    #[tokio::test]
    async fn failing_command_reports_in_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let resp = fetch(state, Some("broken")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Return code: 7"));
    }

    #[tokio::test]
    async fn unknown_view_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), CONFIG).await;

        let resp = fetch(Arc::clone(&state), Some("nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = fetch(state, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
