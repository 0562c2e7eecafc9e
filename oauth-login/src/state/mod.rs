//! Application state management
//!
//! Everything here is built once at startup and read-only afterwards.

use std::sync::Arc;

use crate::config::{AppConfig, Environment, SecuritySettings};
use crate::error::AppError;
use crate::oauth2::{OAuthClient, ProviderRegistry};
use crate::session::{SessionCodec, SessionKey, MIN_SECRET_LEN};

/// Application state shared by every handler
///
/// # Example
///
/// ```rust,no_run
/// use oauth_login::{config::AppConfig, state::AppState};
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::new(AppConfig::load(None)?).await?;
/// let app = oauth_login::router(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct AppState {
    /// Application configuration
    config: Arc<AppConfig>,

    /// Enabled OAuth2 providers
    providers: Arc<ProviderRegistry>,

    /// Outbound OAuth2 HTTP client
    oauth_client: OAuthClient,

    /// Session cookie sealing
    session_codec: Arc<SessionCodec>,
}

impl AppState {
    /// Create application state from configuration
    ///
    /// Resolves the session key, builds the provider registry and runs
    /// OpenID discovery for providers that ask for it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The session secret is missing or too short in production
    /// - An enabled provider is misconfigured
    /// - OpenID discovery fails
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        let session_codec = SessionCodec::new(&session_key(&config.security)?)?;
        let oauth_client = OAuthClient::new(config.oauth2.http_timeout())?;
        let providers = ProviderRegistry::from_config(&config.oauth2)?
            .discover(&oauth_client)
            .await?;

        Ok(Self {
            config: Arc::new(config),
            providers: Arc::new(providers),
            oauth_client,
            session_codec: Arc::new(session_codec),
        })
    }

    /// Get configuration reference
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the provider registry
    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Get the OAuth2 client
    #[must_use]
    pub const fn oauth_client(&self) -> &OAuthClient {
        &self.oauth_client
    }

    /// Get the session codec
    #[must_use]
    pub fn session_codec(&self) -> Arc<SessionCodec> {
        self.session_codec.clone()
    }
}

/// Derive the session key from settings
///
/// Without a configured secret, development falls back to a random key
/// (sessions end on restart) and production refuses to start.
fn session_key(security: &SecuritySettings) -> Result<SessionKey, AppError> {
    let secret = security
        .session_secret
        .as_deref()
        .filter(|secret| !secret.trim().is_empty());

    match (secret, security.environment) {
        (Some(secret), Environment::Production) if secret.len() < MIN_SECRET_LEN => {
            Err(AppError::Config(format!(
                "SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes in production"
            )))
        }
        (Some(secret), _) => Ok(SessionKey::from_secret(secret)?),
        (None, Environment::Production) => Err(AppError::Config(
            "SESSION_SECRET is required in production".to_string(),
        )),
        (None, Environment::Development) => {
            tracing::warn!(
                "SESSION_SECRET is not set; using an ephemeral key, sessions will not survive a restart"
            );
            Ok(SessionKey::generate())
        }
    }
}
