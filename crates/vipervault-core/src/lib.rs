//! Core library for `ViperVault`.
//!
//! Contains the viewer configuration loader, the file-backed session
//! store, the shell command runner, and HTML escaping. This crate knows
//! nothing about HTTP — the server crate wires these pieces behind
//! routes.

pub mod command;
pub mod config;
pub mod error;
pub mod escape;
pub mod session;
