//! Built-in provider defaults
//!
//! Each supported provider contributes a [`ProviderDefaults`] table. Operator
//! settings override individual fields; see
//! [`ProviderRegistry`](crate::oauth2::ProviderRegistry).

pub mod google;
pub mod linkedin;

use crate::oauth2::types::{OAuthProvider, TokenAuthMethod};

/// Endpoints and protocol quirks of a provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderDefaults {
    /// Authorization endpoint
    pub auth_url: &'static str,
    /// Token endpoint
    pub token_url: &'static str,
    /// UserInfo endpoint
    pub userinfo_url: &'static str,
    /// OpenID Connect issuer, used for discovery
    pub issuer: &'static str,
    /// Scopes requested when none are configured
    pub scopes: &'static [&'static str],
    /// Client authentication at the token endpoint
    pub token_auth: TokenAuthMethod,
    /// Whether the provider accepts PKCE
    pub use_pkce: bool,
    /// Extra authorization request parameters
    pub extra_auth_params: &'static [(&'static str, &'static str)],
}

/// Defaults for `provider`
#[must_use]
pub const fn defaults(provider: OAuthProvider) -> &'static ProviderDefaults {
    match provider {
        OAuthProvider::Google => &google::DEFAULTS,
        OAuthProvider::LinkedIn => &linkedin::DEFAULTS,
    }
}
