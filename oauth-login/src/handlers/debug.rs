//! Redirect URI diagnostics
//!
//! Shows the exact callback URLs this server sends, so they can be copied
//! into each provider's app settings.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use super::urls::{callback_url, external_base};
use crate::oauth2::OAuthProvider;
use crate::state::AppState;

/// Response body of `GET /debug/redirects`
#[derive(Debug, Serialize)]
pub struct RedirectUris {
    /// Google callback URL
    pub google_redirect_uri: String,
    /// LinkedIn callback URL
    pub linkedin_redirect_uri: String,
    /// Registration hint
    pub note: String,
}

/// `GET /debug/redirects`
pub async fn debug_redirects(State(state): State<AppState>, headers: HeaderMap) -> Json<RedirectUris> {
    let base = external_base(&state.config().server, &headers);

    Json(RedirectUris {
        google_redirect_uri: callback_url(&base, OAuthProvider::Google),
        linkedin_redirect_uri: callback_url(&base, OAuthProvider::LinkedIn),
        note: note(&base),
    })
}

fn note(base: &str) -> String {
    format!(
        "Register these exact URIs in your Google and LinkedIn app settings. \
They are built from {base}; add another pair for each host name you reach this server by, \
such as localhost and 127.0.0.1."
    )
}
