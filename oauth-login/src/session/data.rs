//! Session payload and flash messages
//!
//! Everything in [`SessionData`] travels inside the sealed session cookie, so
//! it stays small: the logged-in identity, at most one pending login, and the
//! flash messages queued for the next page.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session key holding the logged-in [`Identity`](crate::oauth2::Identity)
pub const USER_KEY: &str = "user";

/// Session key holding the [`PendingLogin`](crate::oauth2::PendingLogin)
pub const PENDING_LOGIN_KEY: &str = "oauth2_pending";

/// Session data carried in the session cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// When this session was created
    pub created_at: DateTime<Utc>,
    /// When this session expires
    pub expires_at: DateTime<Utc>,
    /// Custom session data (key-value store)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,
    /// Flash messages queued for next request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flash_messages: Vec<FlashMessage>,
}

impl SessionData {
    /// Create new session data with default expiration (24 hours)
    #[must_use]
    pub fn new() -> Self {
        Self::with_expiration(Duration::hours(24))
    }

    /// Create session with custom expiration duration
    #[must_use]
    pub fn with_expiration(duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            expires_at: now + duration,
            data: HashMap::new(),
            flash_messages: Vec::new(),
        }
    }

    /// Check if session is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Extend the expiration to `extend_by` from now
    pub fn touch(&mut self, extend_by: Duration) {
        self.expires_at = Utc::now() + extend_by;
    }

    /// Whether the session holds nothing worth persisting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.flash_messages.is_empty()
    }

    /// Get a value from session data
    ///
    /// Values that no longer deserialize as `T` read as absent.
    #[must_use]
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in session data
    ///
    /// # Errors
    ///
    /// Returns error if value cannot be serialized to JSON
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), SessionError> {
        let json_value = serde_json::to_value(value)?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

/// Flash message for one-time display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    /// Message level (success, info, warning, error)
    pub level: FlashLevel,
    /// Message text
    pub message: String,
}

impl FlashMessage {
    /// Create a success flash message
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    /// Create an info flash message
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    /// Create a warning flash message
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }

    /// Create an error flash message
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// Get CSS class for this flash level
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.level.css_class()
    }
}

/// Flash message severity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// Success message (green)
    Success,
    /// Informational message (blue)
    Info,
    /// Warning message (yellow)
    Warning,
    /// Error message (red)
    Error,
}

impl FlashLevel {
    /// Get CSS class for this level
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Info => "flash-info",
            Self::Warning => "flash-warning",
            Self::Error => "flash-error",
        }
    }
}

/// Session-related errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cookie could not be sealed
    #[error("Failed to seal session cookie")]
    Seal,

    /// Cookie is not a valid sealed session (tampered, truncated, or foreign key)
    #[error("Invalid session cookie")]
    InvalidCookie,

    /// Session secret is missing or too short
    #[error("Invalid session secret: {0}")]
    InvalidSecret(String),

    /// Session extension missing from the request
    #[error("Session not initialized")]
    NotInitialized,
}
