//! oauth-login: a minimal login page backed by Google and LinkedIn
//!
//! Authentication is delegated to the providers over the OAuth2 authorization
//! code flow (OpenID Connect userinfo). The resulting identity lives in an
//! encrypted, cookie-backed session; nothing is stored server-side.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use oauth_login::{config::AppConfig, observability, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(None)?;
//!     observability::init(&config.logging)?;
//!
//!     let bind_address = config.server.bind_address();
//!     let state = AppState::new(config).await?;
//!     let app = oauth_login::router(state);
//!
//!     let listener = tokio::net::TcpListener::bind(bind_address).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Routes
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | Login page (or welcome back) |
//! | `GET /login/{provider}` | Start login with `google` or `linkedin` |
//! | `GET /auth/{provider}` | Provider callback |
//! | `GET /profile` | Logged-in user's profile |
//! | `GET /logout` | Forget the identity |
//! | `GET /debug/redirects` | Callback URLs to register (when enabled) |
//! | `GET /health` | Liveness probe |

pub mod config;
pub mod error;
pub mod handlers;
pub mod oauth2;
pub mod observability;
pub mod session;
pub mod state;
pub mod template;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::session::SessionLayer;
use crate::state::AppState;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use oauth_login::prelude::*;
    //! ```

    pub use crate::config::AppConfig;
    pub use crate::error::AppError;
    pub use crate::oauth2::{Identity, OAuthError, OAuthProvider, ProviderRegistry};
    pub use crate::session::{FlashExtractor, FlashMessage, Session, SessionLayer};
    pub use crate::state::AppState;
}

/// Build the application router
///
/// Installs the session layer and HTTP request tracing. Unrouted paths
/// answer 404.
/// `/debug/redirects` is only routed when `server.debug_routes` is set.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/login/{provider}", get(handlers::login))
        .route("/auth/{provider}", get(handlers::callback))
        .route("/profile", get(handlers::profile))
        .route("/logout", get(handlers::logout))
        .route("/health", get(handlers::health));

    if state.config().server.debug_routes {
        router = router.route("/debug/redirects", get(handlers::debug_redirects));
    }

    router
        .fallback(handlers::not_found)
        .layer(SessionLayer::new(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
