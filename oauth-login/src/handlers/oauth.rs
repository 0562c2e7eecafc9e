//! OAuth2 login and callback handlers
//!
//! - `GET /login/{provider}` starts the authorization code flow
//! - `GET /auth/{provider}` verifies the callback, exchanges the code and
//!   stores the resulting [`Identity`] in the session
//!
//! Login failures never surface as error pages: they are logged, flashed and
//! answered with a redirect to `/`.

use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::urls::{callback_url, external_base};
use crate::error::AppError;
use crate::oauth2::{Identity, OAuthError, OAuthProvider, PendingLogin};
use crate::session::{FlashMessage, Session, PENDING_LOGIN_KEY, USER_KEY};
use crate::state::AppState;

/// OAuth2 callback query parameters
///
/// Every field is optional: providers omit `code` when they report `error`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code from provider
    pub code: Option<String>,
    /// CSRF state token
    pub state: Option<String>,
    /// Optional error from provider
    pub error: Option<String>,
    /// Optional error description
    pub error_description: Option<String>,
}

/// Initiate OAuth2 flow
///
/// Stores a [`PendingLogin`] in the session, replacing any earlier one, and
/// answers `302 Found` towards the provider's authorization endpoint.
///
/// # Errors
///
/// Returns [`AppError::OAuth`] for an unknown provider (404) or if the
/// authorization URL cannot be built
pub async fn login(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    headers: HeaderMap,
    session: Session,
) -> Result<Response, AppError> {
    let provider: OAuthProvider = provider_name.parse()?;

    let config = match state.providers().get(provider) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(provider = %provider, "Login attempted with a disabled provider");
            session.flash(FlashMessage::warning(e.to_string()));
            return Ok(Redirect::to("/").into_response());
        }
    };

    let redirect_uri = callback_url(&external_base(&state.config().server, &headers), provider);
    let request = state
        .oauth_client()
        .authorization_request(config, &redirect_uri)?;

    session.set(
        PENDING_LOGIN_KEY,
        PendingLogin::new(provider, &request, redirect_uri.clone()),
    )?;

    tracing::debug!(provider = %provider, redirect_uri = %redirect_uri, "Redirecting to provider");

    Ok((StatusCode::FOUND, [(LOCATION, request.url)]).into_response())
}

/// Handle OAuth2 callback
///
/// On success the identity replaces any previous one and the browser is sent
/// to `/profile`; on failure the session keeps its previous identity.
///
/// # Errors
///
/// Returns [`AppError::OAuth`] for an unknown provider (404) and
/// [`AppError::Session`] if the identity cannot be stored
pub async fn callback(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    Query(params): Query<CallbackParams>,
    session: Session,
) -> Result<Redirect, AppError> {
    let provider: OAuthProvider = provider_name.parse()?;

    match complete_callback(&state, provider, &session, params).await {
        Ok(identity) => {
            tracing::info!(
                provider = %provider,
                subject = %identity.subject_id,
                "User logged in"
            );
            session.set(USER_KEY, &identity)?;
            session.flash(FlashMessage::success(format!(
                "Logged in with {}!",
                provider.label()
            )));
            Ok(Redirect::to("/profile"))
        }
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, "OAuth2 login failed");
            session.flash(FlashMessage::error(format!(
                "Failed to log in with {}: {e}",
                provider.label()
            )));
            Ok(Redirect::to("/"))
        }
    }
}

/// Verify the callback against the pending login and resolve the identity
async fn complete_callback(
    state: &AppState,
    provider: OAuthProvider,
    session: &Session,
    params: CallbackParams,
) -> Result<Identity, OAuthError> {
    // One-time use, whatever the outcome
    let pending = session.take::<PendingLogin>(PENDING_LOGIN_KEY);

    if let Some(error) = params.error {
        return Err(OAuthError::AuthorizationDenied {
            error,
            description: params.error_description,
        });
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return Err(OAuthError::AuthorizationDenied {
            error: "missing_code".to_string(),
            description: Some("No authorization code provided".to_string()),
        });
    };

    let pending = pending.ok_or(OAuthError::InvalidState)?;
    if let Err(e) = pending.verify(provider, params.state.as_deref()) {
        tracing::warn!(
            provider = %provider,
            pending_provider = %pending.provider,
            "OAuth2 state mismatch (potential CSRF attack)"
        );
        return Err(e);
    }

    let config = state.providers().get(provider)?;
    state
        .oauth_client()
        .complete_login(config, &pending, &code)
        .await
}
