//! Page handlers: index, profile, logout, health, not found

use axum::{
    extract::State,
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::oauth2::Identity;
use crate::session::{FlashExtractor, FlashMessage, Session, PENDING_LOGIN_KEY, USER_KEY};
use crate::state::AppState;
use crate::template::{render, LoginPage, ProfilePage};

/// `GET /`
///
/// # Errors
///
/// Returns [`AppError::Template`] if the page fails to render
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    FlashExtractor(flashes): FlashExtractor,
) -> Result<Html<String>, AppError> {
    render(&LoginPage {
        flashes,
        user: session.get::<Identity>(USER_KEY),
        providers: state.providers().enabled().collect(),
    })
}

/// `GET /profile`
///
/// Anonymous visitors are sent back to `/`.
///
/// # Errors
///
/// Returns [`AppError::Template`] if the page fails to render
pub async fn profile(session: Session) -> Result<Response, AppError> {
    let Some(user) = session.get::<Identity>(USER_KEY) else {
        return Ok(Redirect::to("/").into_response());
    };

    let flashes = session.take_flashes();
    Ok(render(&ProfilePage { flashes, user })?.into_response())
}

/// `GET /logout`
pub async fn logout(session: Session) -> Redirect {
    session.remove(PENDING_LOGIN_KEY);

    if session.remove(USER_KEY) {
        tracing::info!("User logged out");
        session.flash(FlashMessage::info("You've been logged out."));
    }

    Redirect::to("/")
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// Fallback for unrouted paths
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
