//! Session middleware for cookie-backed sessions
//!
//! Opens the sealed session cookie on the way in and, when a handler changed
//! the session, seals it back into a `Set-Cookie` header on the way out.
//! Nothing is stored server-side.

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap,
    },
    response::Response,
};
use chrono::Duration;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use super::codec::SessionCodec;
use super::data::SessionData;
use super::extractors::Session;
use crate::config::{SameSitePolicy, SecuritySettings};
use crate::state::AppState;

/// Session cookie attributes
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Cookie name
    pub cookie_name: String,
    /// Cookie path
    pub cookie_path: String,
    /// HTTP-only cookie
    pub http_only: bool,
    /// Secure cookie (HTTPS only)
    pub secure: bool,
    /// `SameSite` policy
    pub same_site: SameSitePolicy,
    /// Session lifetime in seconds
    pub max_age_secs: u64,
}

impl SessionConfig {
    /// Session lifetime as a duration
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        i64::try_from(self.max_age_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(365))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&SecuritySettings::default())
    }
}

impl From<&SecuritySettings> for SessionConfig {
    fn from(settings: &SecuritySettings) -> Self {
        Self {
            cookie_name: settings.cookie_name.clone(),
            cookie_path: "/".to_string(),
            http_only: true,
            secure: settings.secure_cookies,
            same_site: settings.same_site,
            max_age_secs: settings.session_max_age_secs,
        }
    }
}

/// Layer for session middleware
#[derive(Clone, Debug)]
pub struct SessionLayer {
    config: Arc<SessionConfig>,
    codec: Arc<SessionCodec>,
}

impl SessionLayer {
    /// Create a session layer from application state
    #[must_use]
    pub fn new(state: &AppState) -> Self {
        Self {
            config: Arc::new(SessionConfig::from(&state.config().security)),
            codec: state.session_codec(),
        }
    }

    /// Create a session layer with explicit configuration
    #[must_use]
    pub fn with_config(codec: Arc<SessionCodec>, config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
            codec,
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            config: self.config.clone(),
            codec: self.codec.clone(),
        }
    }
}

/// Session middleware that handles cookie-based sessions
#[derive(Clone, Debug)]
pub struct SessionMiddleware<S> {
    inner: S,
    config: Arc<SessionConfig>,
    codec: Arc<SessionCodec>,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let config = self.config.clone();
        let codec = self.codec.clone();
        // Drive the instance that was polled ready, leave the clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let cookie = extract_cookie(req.headers(), &config.cookie_name);
            let had_cookie = cookie.is_some();

            let loaded = cookie.and_then(|value| match codec.open(&value) {
                Ok(data) if !data.is_expired() => Some(data),
                Ok(_) => {
                    tracing::debug!("Session cookie expired, starting a new session");
                    None
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Discarding unreadable session cookie");
                    None
                }
            });
            let stale_cookie = had_cookie && loaded.is_none();

            let session = Session::new(
                loaded.unwrap_or_else(|| SessionData::with_expiration(config.lifetime())),
            );
            req.extensions_mut().insert(session.clone());

            let mut response = inner.call(req).await?;

            if session.is_modified() {
                let mut data = session.snapshot();
                if data.is_empty() {
                    if had_cookie {
                        clear_session_cookie(&mut response, &config);
                    }
                } else {
                    data.touch(config.lifetime());
                    match codec.seal(&data) {
                        Ok(value) => set_session_cookie(&mut response, &value, &config),
                        Err(e) => tracing::error!(error = %e, "Failed to persist session"),
                    }
                }
            } else if stale_cookie {
                clear_session_cookie(&mut response, &config);
            }

            Ok(response)
        })
    }
}

/// Find the session cookie across all `Cookie` headers
fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().to_string())
}

fn cookie_attributes(config: &SessionConfig, max_age: u64) -> String {
    let mut attributes = format!(
        "Path={}; Max-Age={}; SameSite={}",
        config.cookie_path,
        max_age,
        config.same_site.as_str()
    );

    if config.http_only {
        attributes.push_str("; HttpOnly");
    }

    if config.secure {
        attributes.push_str("; Secure");
    }

    attributes
}

/// Set session cookie on response
fn set_session_cookie(response: &mut Response<Body>, value: &str, config: &SessionConfig) {
    let cookie_value = format!(
        "{}={}; {}",
        config.cookie_name,
        value,
        cookie_attributes(config, config.max_age_secs)
    );

    if let Ok(header_value) = cookie_value.parse() {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
}

/// Expire the session cookie in the browser
fn clear_session_cookie(response: &mut Response<Body>, config: &SessionConfig) {
    let cookie_value = format!("{}=; {}", config.cookie_name, cookie_attributes(config, 0));

    if let Ok(header_value) = cookie_value.parse() {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::codec::SessionKey;
    use crate::session::data::FlashMessage;
    use axum::{http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn test_codec() -> Arc<SessionCodec> {
        Arc::new(SessionCodec::new(&SessionKey::from_secret("middleware-test-secret-0123456789").unwrap()).unwrap())
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            cookie_name: "sid".to_string(),
            cookie_path: "/".to_string(),
            http_only: true,
            secure: false,
            same_site: SameSitePolicy::Lax,
            max_age_secs: 3600,
        }
    }

    fn app(codec: Arc<SessionCodec>) -> Router {
        Router::new()
            .route("/read", get(|| async { "read" }))
            .route(
                "/write",
                get(|session: Session| async move {
                    session.set("user", "alice").unwrap();
                    "written"
                }),
            )
            .route(
                "/who",
                get(|session: Session| async move { session.get::<String>("user").unwrap_or_default() }),
            )
            .route(
                "/flash",
                get(|session: Session| async move {
                    session.flash(FlashMessage::info("hello"));
                    "flashed"
                }),
            )
            .route(
                "/forget",
                get(|session: Session| async move {
                    session.remove("user");
                    "forgotten"
                }),
            )
            .layer(SessionLayer::with_config(codec, test_config()))
    }

    fn set_cookie(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_session_config_from_settings() {
        let config = SessionConfig::from(&SecuritySettings::default());
        assert_eq!(config.cookie_name, "oauth_login_session");
        assert!(config.http_only);
        assert_eq!(config.max_age_secs, 86400);
        assert_eq!(config.lifetime(), Duration::hours(24));
    }

    #[test]
    fn test_lifetime_saturates() {
        let config = SessionConfig {
            max_age_secs: u64::MAX,
            ..test_config()
        };
        assert_eq!(config.lifetime(), Duration::days(365));
    }

    #[test]
    fn test_extract_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, "theme=dark".parse().unwrap());
        headers.append(COOKIE, "a=1; sid=abc ; b=2".parse().unwrap());
        assert_eq!(extract_cookie(&headers, "sid").as_deref(), Some("abc"));
        assert!(extract_cookie(&headers, "missing").is_none());
    }

    #[tokio::test]
    async fn test_untouched_session_sets_no_cookie() {
        let response = app(test_codec())
            .oneshot(Request::builder().uri("/read").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie(&response).is_none());
    }

    #[tokio::test]
    async fn test_modified_session_round_trips_through_cookie() {
        let codec = test_codec();
        let response = app(codec.clone())
            .oneshot(Request::builder().uri("/write").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = set_cookie(&response).unwrap();
        assert!(header.starts_with("sid="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=3600"));
        assert!(!header.contains("Secure"));
        assert!(!header.contains("alice"));

        let pair = header.split(';').next().unwrap().to_string();
        let response = app(codec)
            .oneshot(
                Request::builder()
                    .uri("/who")
                    .header(COOKIE, pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "alice");
    }

    #[tokio::test]
    async fn test_tampered_cookie_reads_as_empty_and_is_cleared() {
        let response = app(test_codec())
            .oneshot(
                Request::builder()
                    .uri("/who")
                    .header(COOKIE, "sid=garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header = set_cookie(&response).unwrap();
        assert!(header.starts_with("sid=;"));
        assert!(header.contains("Max-Age=0"));
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_emptied_session_expires_cookie() {
        let codec = test_codec();
        let mut data = SessionData::new();
        data.set("user", "alice").unwrap();
        let sealed = codec.seal(&data).unwrap();

        let response = app(codec)
            .oneshot(
                Request::builder()
                    .uri("/forget")
                    .header(COOKIE, format!("sid={sealed}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_expired_session_is_discarded() {
        let codec = test_codec();
        let mut data = SessionData::with_expiration(Duration::seconds(-5));
        data.set("user", "alice").unwrap();
        let sealed = codec.seal(&data).unwrap();

        let response = app(codec)
            .oneshot(
                Request::builder()
                    .uri("/who")
                    .header(COOKIE, format!("sid={sealed}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_flash_persists_in_cookie() {
        let response = app(test_codec())
            .oneshot(Request::builder().uri("/flash").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(set_cookie(&response).unwrap().starts_with("sid="));
    }
}
