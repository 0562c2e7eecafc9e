//! OAuth2 / OpenID Connect login
//!
//! Supports Google and LinkedIn through one provider-agnostic client:
//!
//! - [`ProviderRegistry`] holds the resolved configuration of each enabled
//!   provider
//! - [`OAuthClient`] builds authorization URLs, exchanges codes and fetches
//!   userinfo claims
//! - [`PendingLogin`] ties a callback to the login that started it (CSRF
//!   state, PKCE verifier, expiry)
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth_login::oauth2::{OAuthClient, OAuthProvider, ProviderRegistry};
//!
//! let registry = ProviderRegistry::from_config(&config.oauth2)?;
//! let google = registry.get(OAuthProvider::Google)?;
//! let request = client.authorization_request(google, "http://localhost:5000/auth/google")?;
//! ```

pub mod client;
pub mod providers;
pub mod registry;
pub mod types;

pub use client::{DiscoveredEndpoints, OAuthClient};
pub use registry::ProviderRegistry;
pub use types::{
    AuthorizationRequest, Identity, OAuthError, OAuthProvider, OAuthToken, PendingLogin,
    ProviderConfig, TokenAuthMethod, UserInfoClaims, PENDING_LOGIN_TTL_MINUTES,
};
