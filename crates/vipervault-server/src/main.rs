//! `ViperVault` server entry point.
//!
//! Loads the server and viewer configuration, builds the shared state,
//! then starts the Axum HTTP server with graceful shutdown. A background
//! session sweeper runs alongside the server and is cancelled on
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::HeaderValue;
use axum::middleware as axum_mw;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use vipervault_core::command::CommandRunner;
use vipervault_core::config::ViewerConfig;
use vipervault_core::session::SessionStore;

use vipervault_server::config::ServerConfig;
use vipervault_server::middleware::require_session;
use vipervault_server::routes;
use vipervault_server::state::AppState;

use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server_config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server_config.log_level)),
        )
        .json()
        .init();

    let config = ViewerConfig::load(&server_config.config_path)
        .await
        .with_context(|| {
            format!(
                "failed to load viewer config from '{}'",
                server_config.config_path
            )
        })?;

    info!(
        views = config.views().len(),
        config = %server_config.config_path,
        "ViperVault starting"
    );

    let sessions = Arc::new(SessionStore::new(
        &server_config.session_dir,
        config.session_duration_secs,
        config.inactivity_timeout_secs,
    ));
    let runner = CommandRunner::new(Duration::from_secs(config.command_timeout_secs));

    let state = Arc::new(AppState {
        config,
        sessions: Arc::clone(&sessions),
        runner,
        cookie_secure: server_config.cookie_secure,
    });

    // Shutdown signal channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn the session sweeper background worker.
    let sweeper_handle = {
        let sessions = Arc::clone(&sessions);
        let mut rx = shutdown_rx.clone();
        let interval_secs = server_config.sweep_interval_secs;
        tokio::spawn(async move {
            session_sweeper(sessions, &mut rx, interval_secs).await;
        })
    };

    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(server_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", server_config.bind_addr))?;

    info!(addr = %server_config.bind_addr, "ViperVault listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;

    info!("ViperVault stopped");
    Ok(())
}

/// Build the Axum router with all routes and middleware.
fn build_router(state: Arc<AppState>) -> Router {
    // The log route is the only one that reaches the shell, and the
    // only one behind the session middleware.
    let protected = routes::logs::router()
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ))
        // Each request spawns a shell; cap how many run at once.
        .layer(tower::limit::ConcurrencyLimitLayer::new(4));

    let api = Router::new().merge(routes::auth::router()).merge(protected);

    Router::new()
        .merge(routes::ui::router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

/// Background worker that periodically removes stale session files.
///
/// Sweeping also happens at every login; this worker covers the case
/// where nobody logs in for a long time but old sessions linger on
/// disk.
async fn session_sweeper(
    sessions: Arc<SessionStore>,
    shutdown: &mut watch::Receiver<bool>,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    info!(interval_secs, "session sweeper started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                sessions.sweep().await;
            }
            _ = shutdown.changed() => {
                info!("session sweeper shutting down");
                return;
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}
