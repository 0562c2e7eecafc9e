//! Configuration management for oauth-login
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Recognized plain environment variables (highest priority, see below)
//! 2. Environment variables with the `LOGIN_` prefix (`__` for nesting)
//! 3. `./config.toml`, or the file passed on the command line
//! 4. `~/.config/oauth-login/config.toml` (user config, XDG)
//! 5. `/etc/oauth-login/config.toml` (system config)
//! 6. Hardcoded defaults (fallback)
//!
//! The recognized plain variables mirror what operators already keep in a
//! `.env` file:
//!
//! | Variable | Setting |
//! |---|---|
//! | `GOOGLE_CLIENT_ID` | `oauth2.google.client_id` |
//! | `GOOGLE_CLIENT_SECRET` | `oauth2.google.client_secret` |
//! | `LINKEDIN_CLIENT_ID` | `oauth2.linkedin.client_id` |
//! | `LINKEDIN_CLIENT_SECRET` | `oauth2.linkedin.client_secret` |
//! | `OAUTH_REDIRECT_HOST` | `server.redirect_host` |
//! | `SESSION_SECRET` | `security.session_secret` |
//! | `APP_ENV` | `security.environment` |
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! redirect_host = "localhost:5000"
//!
//! [security]
//! environment = "production"
//! session_max_age_secs = 86400
//!
//! [oauth2]
//! http_timeout_secs = 10
//!
//! [oauth2.google]
//! client_id = "1234.apps.googleusercontent.com"
//! client_secret = "..."
//!
//! [oauth2.linkedin]
//! enabled = false
//!
//! [logging]
//! format = "json"
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used for system and user configuration files
pub const CONFIG_DIR_NAME: &str = "oauth-login";

/// Prefix for structured environment overrides (`LOGIN_SERVER__PORT=8080`)
pub const ENV_PREFIX: &str = "LOGIN_";

/// Plain environment variables and the setting each one overrides
const RECOGNIZED_ENV: &[(&str, &str)] = &[
    ("GOOGLE_CLIENT_ID", "oauth2.google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "oauth2.google.client_secret"),
    ("LINKEDIN_CLIENT_ID", "oauth2.linkedin.client_id"),
    ("LINKEDIN_CLIENT_SECRET", "oauth2.linkedin.client_secret"),
    ("OAUTH_REDIRECT_HOST", "server.redirect_host"),
    ("SESSION_SECRET", "security.session_secret"),
    ("APP_ENV", "security.environment"),
];

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Scheme used when generating absolute callback URLs
    pub scheme: String,

    /// Host (and optional port) forced into generated callback URLs.
    /// When unset the request's `Host` header is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_host: Option<String>,

    /// Serve `/debug/redirects`
    pub debug_routes: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            scheme: "http".to_string(),
            redirect_host: None,
            debug_routes: true,
        }
    }
}

impl ServerSettings {
    /// Socket address string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; an ephemeral session key is generated when none is configured
    Development,
    /// Production; a session secret is mandatory
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Security configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Deployment environment
    pub environment: Environment,

    /// Secret the session cookie encryption key is derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_secret: Option<String>,

    /// Session maximum age in seconds
    pub session_max_age_secs: u64,

    /// Name of the session cookie
    pub cookie_name: String,

    /// Enable secure cookies (HTTPS only)
    pub secure_cookies: bool,

    /// Cookie `SameSite` policy
    pub same_site: SameSitePolicy,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            session_secret: None,
            session_max_age_secs: 86400, // 24 hours
            cookie_name: "oauth_login_session".to_string(),
            secure_cookies: !cfg!(debug_assertions),
            same_site: SameSitePolicy::Lax,
        }
    }
}

impl std::fmt::Debug for SecuritySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecuritySettings")
            .field("environment", &self.environment)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("session_max_age_secs", &self.session_max_age_secs)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookies", &self.secure_cookies)
            .field("same_site", &self.same_site)
            .finish()
    }
}

/// Cookie `SameSite` policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    /// Strict `SameSite` policy
    Strict,
    /// Lax `SameSite` policy (required for the OAuth2 callback to carry the cookie)
    Lax,
    /// None `SameSite` policy (requires secure cookies)
    None,
}

impl SameSitePolicy {
    /// Cookie attribute value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Per-provider OAuth2 settings
///
/// Endpoint and scope fields override the provider's built-in defaults.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Explicit enable switch. When unset the provider is enabled as soon as
    /// any credential is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// OAuth2 client ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Scopes to request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// Authorization endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Token endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// UserInfo endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_url: Option<String>,

    /// Resolve endpoints from the issuer's OpenID configuration at startup
    pub discovery: bool,
}

impl ProviderSettings {
    /// Whether the operator intends this provider to be available
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or_else(|| {
            self.client_id.as_deref().is_some_and(|id| !id.is_empty())
                || self
                    .client_secret
                    .as_deref()
                    .is_some_and(|secret| !secret.is_empty())
        })
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("enabled", &self.enabled)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("discovery", &self.discovery)
            .finish()
    }
}

/// OAuth2 configuration for all providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// Timeout applied to every outbound call (discovery, token exchange, userinfo)
    pub http_timeout_secs: u64,

    /// Google settings
    pub google: ProviderSettings,

    /// LinkedIn settings
    pub linkedin: ProviderSettings,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: 10,
            google: ProviderSettings::default(),
            linkedin: ProviderSettings::default(),
        }
    }
}

impl OAuthSettings {
    /// Outbound HTTP timeout
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    Compact,
    /// One JSON object per line
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format
    pub format: LogFormat,

    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Complete oauth-login configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Session and cookie settings
    #[serde(default)]
    pub security: SecuritySettings,

    /// OAuth2 provider settings
    #[serde(default)]
    pub oauth2: OAuthSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Load configuration from every source, in precedence order
    ///
    /// `path` replaces `./config.toml` as the local configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` is given but is not an existing file
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file contains invalid TOML syntax
    /// - Configuration values fail type conversion
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = Self::figment(path)?.extract()?;
        Ok(config)
    }

    /// Build the layered figment without extracting it
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is given but is not an existing file, or
    /// the default configuration cannot be serialized
    pub fn figment(path: Option<&Path>) -> anyhow::Result<Figment> {
        let mut figment = Figment::new()
            // 6. Start with defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 5. System config: /etc/oauth-login/config.toml
        let system_config = PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 4. User config: ~/.config/oauth-login/config.toml
        let user_config = Self::recommended_path();
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 3. The explicitly requested file, taken as given, or ./config.toml
        match path {
            Some(path) => {
                anyhow::ensure!(path.is_file(), "Config file {} not found", path.display());
                figment = figment.merge(Toml::file_exact(path));
            }
            None => {
                let local_config = PathBuf::from("./config.toml");
                if local_config.exists() {
                    figment = figment.merge(Toml::file(&local_config));
                }
            }
        }

        // 2. Structured environment overrides, double underscore for nesting
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        // 1. Recognized plain variables
        Ok(figment.merge(recognized_env()))
    }

    /// Get the recommended XDG config path
    ///
    /// # Example
    ///
    /// ```rust
    /// use oauth_login::config::AppConfig;
    ///
    /// let path = AppConfig::recommended_path();
    /// // Returns: ~/.config/oauth-login/config.toml
    /// ```
    #[must_use]
    pub fn recommended_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| config_dir.join(CONFIG_DIR_NAME).join("config.toml"),
        )
    }
}

/// Environment provider for the plain variables in [`RECOGNIZED_ENV`]
fn recognized_env() -> Env {
    let names: Vec<&str> = RECOGNIZED_ENV.iter().map(|(name, _)| *name).collect();

    Env::raw().only(&names).map(|key| {
        RECOGNIZED_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map_or(key.as_str(), |(_, setting)| *setting)
            .to_string()
            .into()
    })
}
