//! Observability (structured logging)
//!
//! Sets up `tracing-subscriber` with an environment-driven filter and one of
//! three output formats. HTTP request spans come from `tower-http`'s
//! `TraceLayer`, installed by [`crate::router`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};

/// Default filter directives when neither `RUST_LOG` nor `logging.filter` is set
#[must_use]
pub const fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,oauth_login=debug,tower_http=debug"
    } else {
        "info"
    }
}

/// Initialize the logging stack
///
/// `RUST_LOG` takes precedence over `logging.filter`.
///
/// # Example
///
/// ```rust,no_run
/// use oauth_login::{config::LoggingSettings, observability};
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init(&LoggingSettings::default())?;
/// tracing::info!("Application started");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the filter directives are invalid or a global
/// subscriber is already installed.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let env_filter = build_filter(settings)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match settings.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init()?,
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()?,
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init()?,
    }

    Ok(())
}

fn build_filter(settings: &LoggingSettings) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = settings.filter.as_deref().unwrap_or(default_filter());
    Ok(EnvFilter::try_new(directives)?)
}
