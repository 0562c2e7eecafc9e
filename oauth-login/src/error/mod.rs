//! Error types and error handling
//!
//! Expected OAuth2 failures (denied consent, bad code, provider outage) never
//! reach this type: the callback handler turns them into flash messages. What
//! remains here are the failures a handler cannot recover from.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::oauth2::OAuthError;
use crate::session::SessionError;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Not Found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// OAuth2 error
    #[error("OAuth2 error: {0}")]
    OAuth(#[from] OAuthError),
}

impl AppError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::OAuth(OAuthError::UnknownProvider(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            (status, "Internal Server Error").into_response()
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
            (status, self.to_string()).into_response()
        }
    }
}
