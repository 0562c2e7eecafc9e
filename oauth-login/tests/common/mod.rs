//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{
        header::{COOKIE, HOST, LOCATION, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use oauth_login::config::{AppConfig, Environment, ProviderSettings};
use oauth_login::state::AppState;
use std::collections::HashMap;
use tower::ServiceExt;

pub const SESSION_SECRET: &str = "integration-test-session-secret-0123456789";
pub const COOKIE_NAME: &str = "oauth_login_session";
pub const HOST_HEADER: &str = "localhost:5000";

/// Configuration with both providers pointed at `provider_uri`
pub fn config(provider_uri: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.security.environment = Environment::Development;
    config.security.session_secret = Some(SESSION_SECRET.to_string());
    config.security.secure_cookies = false;
    config.oauth2.http_timeout_secs = 2;

    config.oauth2.google = ProviderSettings {
        client_id: Some("google-client".to_string()),
        client_secret: Some("google-secret".to_string()),
        token_url: Some(format!("{provider_uri}/google/token")),
        userinfo_url: Some(format!("{provider_uri}/google/userinfo")),
        ..ProviderSettings::default()
    };
    config.oauth2.linkedin = ProviderSettings {
        client_id: Some("linkedin-client".to_string()),
        client_secret: Some("linkedin-secret".to_string()),
        token_url: Some(format!("{provider_uri}/linkedin/token")),
        userinfo_url: Some(format!("{provider_uri}/linkedin/userinfo")),
        ..ProviderSettings::default()
    };

    config
}

pub async fn app(config: AppConfig) -> Router {
    let state = AppState::new(config)
        .await
        .expect("Failed to create state");
    oauth_login::router(state)
}

/// Minimal cookie-keeping client driving the router with `oneshot`
pub struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    pub fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let mut request = Request::builder().uri(uri).header(HOST, HOST_HEADER);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, format!("{COOKIE_NAME}={cookie}"));
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
        {
            let value = set_cookie
                .split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
                .map(|(_, value)| value.to_string())
                .unwrap_or_default();
            self.cookie = (!set_cookie.contains("Max-Age=0") && !value.is_empty()).then_some(value);
        }

        response
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn set_cookie(&mut self, cookie: &str) {
        self.cookie = Some(cookie.to_string());
    }
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn query_params(url: &str) -> HashMap<String, String> {
    oauth2::url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a login and return the `state` sent to the provider
pub async fn start_login(browser: &mut Browser, provider: &str) -> String {
    let response = browser.get(&format!("/login/{provider}")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    query_params(&location(&response))["state"].clone()
}
