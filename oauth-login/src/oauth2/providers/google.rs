//! Google OAuth2 provider
//!
//! Google speaks standard OpenID Connect. The account chooser is forced with
//! `prompt=select_account` so switching Google accounts is possible after
//! logout.

use super::ProviderDefaults;
use crate::oauth2::types::TokenAuthMethod;

/// Google endpoints
pub const DEFAULTS: ProviderDefaults = ProviderDefaults {
    auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
    issuer: "https://accounts.google.com",
    scopes: &["openid", "email", "profile"],
    token_auth: TokenAuthMethod::ClientSecretBasic,
    use_pkce: true,
    extra_auth_params: &[("prompt", "select_account")],
};
