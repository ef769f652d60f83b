//! `ViperVault` HTTP server.
//!
//! Wires the core library (config, sessions, command runner) into a
//! running Axum server. Serves the JSON/text API under `/api/*` and the
//! single-page viewer UI at `/`.

pub mod config;
pub mod cookie;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
