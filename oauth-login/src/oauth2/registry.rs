//! Provider registry
//!
//! Resolved, immutable configuration for every enabled provider. Built once
//! at startup from [`OAuthSettings`] and shared through application state.

use std::collections::HashMap;

use super::client::{DiscoveredEndpoints, OAuthClient};
use super::providers::{self, ProviderDefaults};
use super::types::{OAuthError, OAuthProvider, ProviderConfig};
use crate::config::{OAuthSettings, ProviderSettings};

/// Enabled providers and their configuration
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<OAuthProvider, ProviderConfig>,
    discovery: Vec<(OAuthProvider, ProviderSettings)>,
}

impl ProviderRegistry {
    /// Build configs for every enabled provider
    ///
    /// A provider is enabled when its `enabled` flag is set, or when the flag
    /// is unset and any credential is present.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Configuration`] if an enabled provider lacks a
    /// client ID or secret, or has an endpoint that is not a URL
    pub fn from_config(settings: &OAuthSettings) -> Result<Self, OAuthError> {
        let mut registry = Self::default();

        for provider in OAuthProvider::ALL {
            let provider_settings = settings_for(settings, provider);

            if !provider_settings.is_enabled() {
                tracing::debug!(provider = %provider, "OAuth2 provider disabled");
                continue;
            }

            let config = build_config(provider, provider_settings, providers::defaults(provider))?;
            tracing::info!(provider = %provider, "OAuth2 provider enabled");

            if provider_settings.discovery {
                registry.discovery.push((provider, provider_settings.clone()));
            }
            registry.providers.insert(provider, config);
        }

        if registry.providers.is_empty() {
            tracing::warn!("No OAuth2 provider is configured; the login page will offer no sign-in");
        }

        Ok(registry)
    }

    /// Replace endpoints with those published by each provider's issuer
    ///
    /// Only providers with `discovery = true` are contacted. Endpoints set
    /// explicitly in the settings keep precedence over discovered ones.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Configuration`] if any discovery fails
    pub async fn discover(mut self, client: &OAuthClient) -> Result<Self, OAuthError> {
        for (provider, settings) in std::mem::take(&mut self.discovery) {
            let issuer = providers::defaults(provider).issuer;
            let endpoints = client.discover(issuer).await?;

            if let Some(config) = self.providers.get_mut(&provider) {
                apply_discovered(config, &settings, endpoints);
                tracing::info!(provider = %provider, issuer, "Resolved endpoints via OpenID discovery");
            }
        }

        Ok(self)
    }

    /// Configuration of an enabled provider
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::ProviderNotConfigured`] if the provider is not
    /// enabled
    pub fn get(&self, provider: OAuthProvider) -> Result<&ProviderConfig, OAuthError> {
        self.providers
            .get(&provider)
            .ok_or(OAuthError::ProviderNotConfigured(provider))
    }

    /// Check if a provider is enabled
    #[must_use]
    pub fn is_enabled(&self, provider: OAuthProvider) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Enabled providers, in display order
    pub fn enabled(&self) -> impl Iterator<Item = OAuthProvider> + '_ {
        OAuthProvider::ALL
            .into_iter()
            .filter(|provider| self.is_enabled(*provider))
    }
}

const fn settings_for(settings: &OAuthSettings, provider: OAuthProvider) -> &ProviderSettings {
    match provider {
        OAuthProvider::Google => &settings.google,
        OAuthProvider::LinkedIn => &settings.linkedin,
    }
}

fn env_var_name(provider: OAuthProvider, field: &str) -> String {
    format!("{}_{field}", provider.as_str().to_uppercase())
}

fn required(
    provider: OAuthProvider,
    value: Option<&String>,
    field: &str,
) -> Result<String, OAuthError> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            OAuthError::Configuration(format!(
                "{} is enabled but {} is not set",
                provider.label(),
                env_var_name(provider, field)
            ))
        })
}

fn endpoint(
    provider: OAuthProvider,
    configured: Option<&String>,
    default: &str,
) -> Result<String, OAuthError> {
    let url = configured.map_or(default, String::as_str);
    oauth2::url::Url::parse(url).map_err(|e| {
        OAuthError::Configuration(format!("{} endpoint {url} is invalid: {e}", provider.label()))
    })?;
    Ok(url.to_string())
}

fn build_config(
    provider: OAuthProvider,
    settings: &ProviderSettings,
    defaults: &ProviderDefaults,
) -> Result<ProviderConfig, OAuthError> {
    let client_id = required(provider, settings.client_id.as_ref(), "CLIENT_ID")?;
    let client_secret = required(provider, settings.client_secret.as_ref(), "CLIENT_SECRET")?;

    let scopes = settings
        .scopes
        .clone()
        .filter(|scopes| !scopes.is_empty())
        .unwrap_or_else(|| defaults.scopes.iter().map(ToString::to_string).collect());

    Ok(ProviderConfig {
        provider,
        client_id,
        client_secret,
        auth_url: endpoint(provider, settings.auth_url.as_ref(), defaults.auth_url)?,
        token_url: endpoint(provider, settings.token_url.as_ref(), defaults.token_url)?,
        userinfo_url: endpoint(provider, settings.userinfo_url.as_ref(), defaults.userinfo_url)?,
        scopes,
        token_auth: defaults.token_auth,
        use_pkce: defaults.use_pkce,
        extra_auth_params: defaults
            .extra_auth_params
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect(),
    })
}

fn apply_discovered(
    config: &mut ProviderConfig,
    settings: &ProviderSettings,
    endpoints: DiscoveredEndpoints,
) {
    if settings.auth_url.is_none() {
        config.auth_url = endpoints.auth_url;
    }
    if settings.token_url.is_none() {
        config.token_url = endpoints.token_url;
    }
    if settings.userinfo_url.is_none() {
        config.userinfo_url = endpoints.userinfo_url;
    }
}
