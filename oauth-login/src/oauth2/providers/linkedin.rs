//! LinkedIn OAuth2 provider
//!
//! "Sign In with LinkedIn using OpenID Connect". LinkedIn expects the client
//! credentials in the token request body and does not support PKCE for web
//! applications.

use super::ProviderDefaults;
use crate::oauth2::types::TokenAuthMethod;

/// LinkedIn endpoints
pub const DEFAULTS: ProviderDefaults = ProviderDefaults {
    auth_url: "https://www.linkedin.com/oauth/v2/authorization",
    token_url: "https://www.linkedin.com/oauth/v2/accessToken",
    userinfo_url: "https://api.linkedin.com/v2/userinfo",
    issuer: "https://www.linkedin.com/oauth",
    scopes: &["openid", "profile", "email"],
    token_auth: TokenAuthMethod::ClientSecretPost,
    use_pkce: false,
    extra_auth_params: &[],
};
