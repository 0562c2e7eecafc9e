//! Askama page templates
//!
//! Templates live in `templates/` at the crate root and are compiled into the
//! binary. Handlers render them through [`render`].

use askama::Template;
use axum::response::Html;

use crate::error::AppError;
use crate::oauth2::{Identity, OAuthProvider};
use crate::session::FlashMessage;

/// Login page, also shown to logged-in users
#[derive(Debug, Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    /// Flash messages to display once
    pub flashes: Vec<FlashMessage>,
    /// Current identity, if logged in
    pub user: Option<Identity>,
    /// Providers offered as login buttons
    pub providers: Vec<OAuthProvider>,
}

/// Profile page of the logged-in user
#[derive(Debug, Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    /// Flash messages to display once
    pub flashes: Vec<FlashMessage>,
    /// Current identity
    pub user: Identity,
}

/// Render a template into an HTML response body
///
/// # Errors
///
/// Returns [`AppError::Template`] if rendering fails
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
