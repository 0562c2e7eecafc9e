//! Core OAuth2 types
//!
//! Provider identifiers, resolved provider configuration, tokens, the
//! identity stored in the session, and the error taxonomy of the login flow.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How long a login may stay pending between `/login/{provider}` and the callback
pub const PENDING_LOGIN_TTL_MINUTES: i64 = 10;

/// OAuth2 provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    /// Google (OpenID Connect)
    Google,
    /// LinkedIn (OpenID Connect)
    #[serde(rename = "linkedin")]
    LinkedIn,
}

impl OAuthProvider {
    /// Every supported provider, in display order
    pub const ALL: [Self; 2] = [Self::Google, Self::LinkedIn];

    /// Get the provider as a string (lowercase), as used in routes
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::LinkedIn => "linkedin",
        }
    }

    /// Human readable provider name
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "linkedin" => Ok(Self::LinkedIn),
            _ => Err(OAuthError::UnknownProvider(s.to_string())),
        }
    }
}

/// How client credentials are presented to the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAuthMethod {
    /// HTTP Basic authentication (`client_secret_basic`)
    ClientSecretBasic,
    /// Form body parameters (`client_secret_post`)
    ClientSecretPost,
}

/// Resolved configuration for one enabled provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// Provider this configuration belongs to
    pub provider: OAuthProvider,
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// UserInfo endpoint
    pub userinfo_url: String,
    /// OAuth2 scopes to request
    pub scopes: Vec<String>,
    /// Client authentication at the token endpoint
    pub token_auth: TokenAuthMethod,
    /// Send a PKCE challenge with the authorization request
    pub use_pkce: bool,
    /// Additional authorization request parameters
    pub extra_auth_params: Vec<(String, String)>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("scopes", &self.scopes)
            .field("token_auth", &self.token_auth)
            .field("use_pkce", &self.use_pkce)
            .field("extra_auth_params", &self.extra_auth_params)
            .finish()
    }
}

/// Authorization request ready to be sent to the browser
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Full authorization URL, including query
    pub url: String,
    /// CSRF state token embedded in the URL
    pub state: String,
    /// PKCE verifier matching the embedded challenge
    pub pkce_verifier: Option<String>,
}

/// Login started by `/login/{provider}` and awaiting its callback
///
/// Stored in the session; consumed exactly once by the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// Provider the login was started with
    pub provider: OAuthProvider,
    /// CSRF state token sent to the provider
    pub state: String,
    /// PKCE verifier, when the provider uses PKCE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkce_verifier: Option<String>,
    /// Redirect URI sent with the authorization request
    pub redirect_uri: String,
    /// When this pending login stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl PendingLogin {
    /// Record a freshly issued authorization request
    #[must_use]
    pub fn new(provider: OAuthProvider, request: &AuthorizationRequest, redirect_uri: String) -> Self {
        Self {
            provider,
            state: request.state.clone(),
            pkce_verifier: request.pkce_verifier.clone(),
            redirect_uri,
            expires_at: Utc::now() + Duration::minutes(PENDING_LOGIN_TTL_MINUTES),
        }
    }

    /// Check if the pending login has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Verify a callback against this pending login
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidState`] if the login expired, was started
    /// with another provider, or the returned state differs.
    pub fn verify(&self, provider: OAuthProvider, state: Option<&str>) -> Result<(), OAuthError> {
        if self.is_expired() || self.provider != provider {
            return Err(OAuthError::InvalidState);
        }

        match state {
            Some(state) if state == self.state => Ok(()),
            _ => Err(OAuthError::InvalidState),
        }
    }
}

/// OAuth2 bearer access token
#[derive(Clone)]
pub struct OAuthToken {
    /// Access token
    pub access_token: String,
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Claims returned by an OpenID Connect userinfo endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfoClaims {
    /// Subject identifier
    pub sub: Option<String>,
    /// Full name
    pub name: Option<String>,
    /// Given name
    pub given_name: Option<String>,
    /// Family name
    pub family_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Profile picture URL
    pub picture: Option<String>,
}

/// Identity of the logged-in user, as stored in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider the identity was established with
    pub provider: OAuthProvider,
    /// Provider-specific subject identifier
    pub subject_id: String,
    /// Display name
    pub display_name: String,
    /// Email address (empty when the provider did not share one)
    pub email: String,
    /// Profile picture URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

impl Identity {
    /// Map userinfo claims into an identity tagged with `provider`
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::UserInfoFailed`] if the claims carry no subject.
    pub fn from_claims(provider: OAuthProvider, claims: UserInfoClaims) -> Result<Self, OAuthError> {
        let subject_id = claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| OAuthError::UserInfoFailed("Missing subject (sub) claim".to_string()))?;

        let email = claims.email.unwrap_or_default();
        let display_name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                let joined = [claims.given_name.as_deref(), claims.family_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                (!joined.is_empty()).then_some(joined)
            })
            .unwrap_or_else(|| email.clone());

        Ok(Self {
            provider,
            subject_id,
            display_name,
            email,
            picture_url: claims.picture.filter(|url| !url.is_empty()),
        })
    }
}

/// OAuth2 errors
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Unknown provider
    #[error("Unknown OAuth2 provider: {0}")]
    UnknownProvider(String),

    /// Provider not configured
    #[error("{} sign-in is not configured", .0.label())]
    ProviderNotConfigured(OAuthProvider),

    /// Provider reported an error or returned no authorization code
    #[error("Authorization denied: {error}{}", description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    AuthorizationDenied {
        /// Error code from the provider
        error: String,
        /// Optional human readable description
        description: Option<String>,
    },

    /// Missing, expired or mismatched CSRF state (potential CSRF attack)
    #[error("Invalid or expired login state, please try again")]
    InvalidState,

    /// Authorization code exchange failed
    #[error("Failed to exchange authorization code for token: {0}")]
    TokenExchangeFailed(String),

    /// Failed to fetch user info
    #[error("Failed to fetch user information: {0}")]
    UserInfoFailed(String),

    /// Invalid provider configuration
    #[error("OAuth2 configuration error: {0}")]
    Configuration(String),

}
