//! Server configuration for `ViperVault`.
//!
//! Loads process-level settings from environment variables with sensible
//! defaults. The viewer configuration (password, views, timeouts) lives
//! in the JSON file pointed to by `VIPERVAULT_CONFIG` and is loaded
//! separately by `vipervault-core`.

use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Path to the viewer configuration JSON file.
    pub config_path: String,
    /// Directory holding session files.
    pub session_dir: String,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Seconds between background session sweeps.
    pub sweep_interval_secs: u64,
    /// Whether to mark the session cookie `Secure` (set when serving
    /// behind an HTTPS-terminating proxy).
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `VIPERVAULT_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8780`)
    /// - `VIPERVAULT_CONFIG` — viewer config file (default: `./vipervault.json`)
    /// - `VIPERVAULT_SESSION_DIR` — session directory (default: `./.sessions`)
    /// - `VIPERVAULT_LOG_LEVEL` — log filter (default: `info`)
    /// - `VIPERVAULT_SWEEP_INTERVAL` — seconds between session sweeps (default: `300`)
    /// - `VIPERVAULT_COOKIE_SECURE` — mark the session cookie `Secure` (default: `false`)
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = resolve_bind_addr(
            std::env::var("VIPERVAULT_BIND_ADDR").ok(),
            std::env::var("PORT").ok(),
        );

        let config_path = std::env::var("VIPERVAULT_CONFIG")
            .unwrap_or_else(|_| "./vipervault.json".to_owned());

        let session_dir = std::env::var("VIPERVAULT_SESSION_DIR")
            .unwrap_or_else(|_| "./.sessions".to_owned());

        let log_level =
            std::env::var("VIPERVAULT_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let sweep_interval_secs = std::env::var("VIPERVAULT_SWEEP_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let cookie_secure = std::env::var("VIPERVAULT_COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            bind_addr,
            config_path,
            session_dir,
            log_level,
            sweep_interval_secs,
            cookie_secure,
        }
    }
}

/// Default listen address.
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
    8780,
);

/// Resolve the bind address. Priority: `VIPERVAULT_BIND_ADDR` > `PORT`
/// (binds `0.0.0.0`) > default `127.0.0.1:8780`.
///
/// Malformed values fall back to the default — loudly, so a
/// misconfigured operator sees why the listener ended up on loopback.
/// Uses `eprintln` because this runs before logging is initialized.
#[allow(clippy::print_stderr)]
fn resolve_bind_addr(bind_addr: Option<String>, port: Option<String>) -> SocketAddr {
    if let Some(addr) = bind_addr {
        return match addr.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!(
                    "WARNING: invalid VIPERVAULT_BIND_ADDR '{addr}' ({e}), using {DEFAULT_BIND_ADDR}"
                );
                DEFAULT_BIND_ADDR
            }
        };
    }

    if let Some(port_str) = port {
        return match port_str.parse::<u16>() {
            Ok(port) => SocketAddr::from(([0, 0, 0, 0], port)),
            Err(e) => {
                eprintln!("WARNING: invalid PORT '{port_str}' ({e}), using {DEFAULT_BIND_ADDR}");
                DEFAULT_BIND_ADDR
            }
        };
    }

    DEFAULT_BIND_ADDR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_bind_addr_wins_over_port() {
        let addr = resolve_bind_addr(Some("0.0.0.0:9999".to_owned()), Some("1234".to_owned()));
        assert_eq!(addr, SocketAddr::from(([0, 0, 0, 0], 9999)));
    }

    #[test]
    fn port_binds_all_interfaces() {
        let addr = resolve_bind_addr(None, Some("8080".to_owned()));
        assert_eq!(addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
    }

    #[test]
    fn malformed_bind_addr_falls_back_to_default() {
        let addr = resolve_bind_addr(Some("not-an-address".to_owned()), None);
        assert_eq!(addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn malformed_port_falls_back_to_default() {
        let addr = resolve_bind_addr(None, Some("eighty".to_owned()));
        assert_eq!(addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn nothing_set_uses_loopback_default() {
        assert_eq!(resolve_bind_addr(None, None), DEFAULT_BIND_ADDR);
    }
}

