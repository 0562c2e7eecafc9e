//! HTTP handlers
//!
//! Routes are assembled in [`crate::router`].

pub mod debug;
pub mod oauth;
pub mod pages;
pub mod urls;

pub use debug::debug_redirects;
pub use oauth::{callback, login, CallbackParams};
pub use pages::{health, index, logout, not_found, profile};
