//! HTTP route modules.

pub mod auth;
pub mod logs;
pub mod ui;
