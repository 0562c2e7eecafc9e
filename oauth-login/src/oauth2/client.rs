//! OAuth2 client shared by every provider
//!
//! Builds authorization URLs with the `oauth2` crate, then performs the token
//! exchange and userinfo fetch directly over `reqwest` so that minimal
//! provider responses (an `access_token` without `token_type`) are accepted.
//! Discovery reads the issuer's metadata document into `openidconnect`'s
//! typed form; the JWKS is not fetched since ID tokens are never verified.

use oauth2::{basic::BasicClient, AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, RedirectUrl, Scope};
use openidconnect::{core::CoreProviderMetadata, IssuerUrl};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;

use super::types::{
    AuthorizationRequest, Identity, OAuthError, OAuthToken, PendingLogin, ProviderConfig,
    TokenAuthMethod, UserInfoClaims,
};

/// Endpoints resolved from an issuer's OpenID configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEndpoints {
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// UserInfo endpoint
    pub userinfo_url: String,
}

/// Token endpoint response, as lenient as providers require
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    token_type: Option<String>,
}

/// HTTP side of the login flow
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
}

impl OAuthClient {
    /// Create a client whose outbound calls give up after `timeout`
    ///
    /// Redirects are never followed.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| OAuthError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Generate the authorization URL, CSRF state and PKCE verifier
    ///
    /// # Errors
    ///
    /// Returns error if the authorization endpoint or redirect URI is not a
    /// valid URL
    pub fn authorization_request(
        &self,
        config: &ProviderConfig,
        redirect_uri: &str,
    ) -> Result<AuthorizationRequest, OAuthError> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_auth_uri(
                AuthUrl::new(config.auth_url.clone())
                    .map_err(|e| OAuthError::Configuration(format!("Invalid auth URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.to_string())
                    .map_err(|e| OAuthError::Configuration(format!("Invalid redirect URI: {e}")))?,
            );

        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(config.scopes.iter().cloned().map(Scope::new));

        for (name, value) in &config.extra_auth_params {
            request = request.add_extra_param(name.as_str(), value.as_str());
        }

        let pkce_verifier = if config.use_pkce {
            let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
            request = request.set_pkce_challenge(pkce_challenge);
            Some(pkce_verifier.secret().clone())
        } else {
            None
        };

        let (auth_url, csrf_state) = request.url();

        Ok(AuthorizationRequest {
            url: auth_url.to_string(),
            state: csrf_state.secret().clone(),
            pkce_verifier,
        })
    }

    /// Exchange authorization code for access token
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TokenExchangeFailed`] on transport failure,
    /// timeout, non-success status, unparseable body, or a missing
    /// `access_token`
    pub async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
        pkce_verifier: Option<&str>,
    ) -> Result<OAuthToken, OAuthError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", config.client_id.as_str()),
        ];
        if let Some(verifier) = pkce_verifier {
            form.push(("code_verifier", verifier));
        }

        let mut request = self
            .http
            .post(&config.token_url)
            .header(ACCEPT, "application/json");

        match config.token_auth {
            TokenAuthMethod::ClientSecretBasic => {
                request = request.basic_auth(&config.client_id, Some(&config.client_secret));
            }
            TokenAuthMethod::ClientSecretPost => {
                form.push(("client_secret", config.client_secret.as_str()));
            }
        }

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(describe_transport_error(&e)))?;

        let body: TokenEndpointResponse = check_http_response(response)
            .await
            .map_err(OAuthError::TokenExchangeFailed)?;

        let access_token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                OAuthError::TokenExchangeFailed("Token response has no access_token".to_string())
            })?;

        // A missing token_type is taken as bearer
        if let Some(token_type) = body
            .token_type
            .filter(|token_type| !token_type.eq_ignore_ascii_case("bearer"))
        {
            return Err(OAuthError::TokenExchangeFailed(format!(
                "Unsupported token type: {token_type}"
            )));
        }

        Ok(OAuthToken { access_token })
    }

    /// Fetch the userinfo claims for `token`
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::UserInfoFailed`] on transport failure, timeout,
    /// non-success status, or unparseable body
    pub async fn fetch_claims(
        &self,
        config: &ProviderConfig,
        token: &OAuthToken,
    ) -> Result<UserInfoClaims, OAuthError> {
        let response = self
            .http
            .get(&config.userinfo_url)
            .header(ACCEPT, "application/json")
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| OAuthError::UserInfoFailed(describe_transport_error(&e)))?;

        check_http_response(response)
            .await
            .map_err(OAuthError::UserInfoFailed)
    }

    /// Fetch the userinfo claims and map them to an [`Identity`]
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::UserInfoFailed`] if the fetch fails or the claims
    /// carry no subject
    pub async fn fetch_identity(
        &self,
        config: &ProviderConfig,
        token: &OAuthToken,
    ) -> Result<Identity, OAuthError> {
        let claims = self.fetch_claims(config, token).await?;
        Identity::from_claims(config.provider, claims)
    }

    /// Finish a verified login: exchange `code` and resolve the identity
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error
    pub async fn complete_login(
        &self,
        config: &ProviderConfig,
        pending: &PendingLogin,
        code: &str,
    ) -> Result<Identity, OAuthError> {
        let token = self
            .exchange_code(
                config,
                code,
                &pending.redirect_uri,
                pending.pkce_verifier.as_deref(),
            )
            .await?;

        tracing::debug!(provider = %config.provider, "Authorization code exchanged");

        self.fetch_identity(config, &token).await
    }

    /// Resolve endpoints from an issuer's OpenID configuration document
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Configuration`] if the issuer URL is invalid,
    /// the document cannot be fetched or parsed, names a different issuer,
    /// or lacks a token or userinfo endpoint
    pub async fn discover(&self, issuer: &str) -> Result<DiscoveredEndpoints, OAuthError> {
        let discovery_failed =
            |e: String| OAuthError::Configuration(format!("Failed to discover provider {issuer}: {e}"));

        let issuer_url = IssuerUrl::new(issuer.to_string())
            .map_err(|e| OAuthError::Configuration(format!("Invalid issuer URL: {e}")))?;
        let document_url = issuer_url
            .join(".well-known/openid-configuration")
            .map_err(|e| OAuthError::Configuration(format!("Invalid issuer URL: {e}")))?;

        let response = self
            .http
            .get(document_url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| discovery_failed(describe_transport_error(&e)))?;

        let provider_metadata: CoreProviderMetadata =
            check_http_response(response).await.map_err(discovery_failed)?;

        if provider_metadata.issuer().as_str() != issuer_url.as_str() {
            return Err(discovery_failed(format!(
                "document names issuer {}",
                provider_metadata.issuer().as_str()
            )));
        }

        let auth_url = provider_metadata.authorization_endpoint().to_string();

        let token_url = provider_metadata
            .token_endpoint()
            .ok_or_else(|| OAuthError::Configuration(format!("{issuer} has no token endpoint")))?
            .to_string();

        let userinfo_url = provider_metadata
            .userinfo_endpoint()
            .ok_or_else(|| {
                OAuthError::Configuration(format!("{issuer} has no userinfo endpoint"))
            })?
            .to_string();

        Ok(DiscoveredEndpoints {
            auth_url,
            token_url,
            userinfo_url,
        })
    }
}

/// Check HTTP response status and parse JSON
///
/// Non-success statuses are reported as `HTTP <status>: <error>` using the
/// OAuth2 `error` field when the body carries one.
async fn check_http_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, String> {
    let status = response.status();

    if !status.is_success() {
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error")
                    .and_then(serde_json::Value::as_str)
                    .map(ToString::to_string)
            });

        return Err(match detail {
            Some(error) => format!("HTTP {status}: {error}"),
            None => format!("HTTP {status}"),
        });
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse JSON: {e}"))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    }
}
