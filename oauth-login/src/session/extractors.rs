//! Session and flash message extractors
//!
//! [`SessionMiddleware`](super::SessionMiddleware) places a [`Session`] handle
//! in the request extensions. Handlers mutate it through the handle and the
//! middleware seals the result into the response cookie.

use axum::{extract::FromRequestParts, http::request::Parts};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use super::data::{FlashMessage, SessionData, SessionError};
use crate::error::AppError;

#[derive(Debug)]
struct SessionState {
    data: SessionData,
    modified: bool,
}

/// Shared handle to the current request's session
///
/// Cloning the handle shares the underlying data.
///
/// # Example
///
/// ```rust,ignore
/// use oauth_login::session::Session;
///
/// async fn handler(session: Session) {
///     let user: Option<Identity> = session.get("user");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Wrap loaded session data
    #[must_use]
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                data,
                modified: false,
            })),
        }
    }

    /// Get a value from the session
    #[must_use]
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.inner.lock().data.get(key)
    }

    /// Set a value in the session
    ///
    /// # Errors
    ///
    /// Returns error if value cannot be serialized to JSON
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        state.data.set(key, value)?;
        state.modified = true;
        Ok(())
    }

    /// Remove a value, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        let mut state = self.inner.lock();
        let removed = state.data.remove(key).is_some();
        state.modified |= removed;
        removed
    }

    /// Remove a value and return it
    ///
    /// The key is removed even if its value does not deserialize as `T`.
    pub fn take<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let mut state = self.inner.lock();
        let value = state.data.remove(key)?;
        state.modified = true;
        serde_json::from_value(value).ok()
    }

    /// Queue a flash message for the next rendered page
    pub fn flash(&self, message: FlashMessage) {
        let mut state = self.inner.lock();
        state.data.flash_messages.push(message);
        state.modified = true;
    }

    /// Take all queued flash messages
    pub fn take_flashes(&self) -> Vec<FlashMessage> {
        let mut state = self.inner.lock();
        if state.data.flash_messages.is_empty() {
            return Vec::new();
        }
        state.modified = true;
        std::mem::take(&mut state.data.flash_messages)
    }

    /// Whether the session changed since it was loaded
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.inner.lock().modified
    }

    /// Copy of the current session data
    #[must_use]
    pub fn snapshot(&self) -> SessionData {
        self.inner.lock().data.clone()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AppError::Session(SessionError::NotInitialized))
    }
}

/// Extractor for flash messages
///
/// Takes the queued flash messages out of the session, so each message is
/// rendered exactly once.
#[derive(Debug, Clone, Default)]
pub struct FlashExtractor(pub Vec<FlashMessage>);

impl<S> FromRequestParts<S> for FlashExtractor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let messages = parts
            .extensions
            .get::<Session>()
            .map(Session::take_flashes)
            .unwrap_or_default();

        Ok(Self(messages))
    }
}
