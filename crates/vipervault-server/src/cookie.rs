//! Session cookie handling.
//!
//! The session token travels in a single `session_token` cookie:
//! `HttpOnly` so scripts never see it, `SameSite=Lax` so same-site
//! redirects keep working, and `Secure` when the server sits behind an
//! HTTPS-terminating proxy.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_token";

/// Build the `Set-Cookie` value that establishes a session.
#[must_use]
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut value = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
    );
    if secure {
        value.push_str("; Secure");
    }
    value
}

/// Build the `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn clear_cookie(secure: bool) -> String {
    let mut value =
        format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        value.push_str("; Secure");
    }
    value
}

/// Extract the session token from the request's `Cookie` header.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_owned())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn session_cookie_has_expected_attributes() {
        let value = session_cookie("tok123", 86_400, false);
        assert_eq!(
            value,
            "session_token=tok123; Path=/; Max-Age=86400; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn secure_flag_appends_secure() {
        assert!(session_cookie("t", 60, true).ends_with("; Secure"));
        assert!(clear_cookie(true).ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let value = clear_cookie(false);
        assert!(value.contains("Max-Age=0"));
        assert!(value.starts_with("session_token=;"));
    }

    #[test]
    fn parses_token_from_cookie_header() {
        let headers = headers_with_cookie("theme=dark; session_token=abc-123; other=x");
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn empty_value_is_none() {
        let headers = headers_with_cookie("session_token=");
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn unrelated_cookies_are_ignored() {
        let headers = headers_with_cookie("session=abc; token=def");
        assert_eq!(session_token(&headers), None);
    }
}
