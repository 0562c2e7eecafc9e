//! External URL computation
//!
//! Callback URLs must match what is registered with each provider, so they
//! are built from `server.redirect_host` when set and from the request's
//! `Host` header otherwise.

use axum::http::{header::HOST, HeaderMap};

use crate::config::ServerSettings;
use crate::oauth2::OAuthProvider;

/// Scheme and authority under which the browser reaches this server
///
/// Host resolution order: `server.redirect_host`, the `Host` header, then the
/// bind address. A `redirect_host` that already carries a scheme is used
/// as-is.
#[must_use]
pub fn external_base(server: &ServerSettings, headers: &HeaderMap) -> String {
    let host = server
        .redirect_host
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| server.bind_address());

    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("{}://{host}", server.scheme)
    }
}

/// Callback URL for `provider` under `base`
#[must_use]
pub fn callback_url(base: &str, provider: OAuthProvider) -> String {
    format!("{base}/auth/{}", provider.as_str())
}
