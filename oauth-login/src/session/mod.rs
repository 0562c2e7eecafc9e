//! Cookie-backed sessions
//!
//! The whole session lives client-side in a single AES-256-GCM sealed cookie:
//!
//! - [`SessionCodec`] seals and opens cookie values
//! - [`SessionLayer`] loads the session per request and persists changes
//! - [`Session`] is the handler-facing handle, [`FlashExtractor`] drains
//!   one-time messages
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth_login::session::{FlashMessage, Session};
//!
//! async fn handler(session: Session) {
//!     session.flash(FlashMessage::info("Hello"));
//! }
//! ```

pub mod codec;
pub mod data;
pub mod extractors;
pub mod middleware;

pub use codec::{SessionCodec, SessionKey, MIN_SECRET_LEN};
pub use data::{
    FlashLevel, FlashMessage, SessionData, SessionError, PENDING_LOGIN_KEY, USER_KEY,
};
pub use extractors::{FlashExtractor, Session};
pub use middleware::{SessionConfig, SessionLayer, SessionMiddleware};
