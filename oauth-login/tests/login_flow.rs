//! End-to-end login flow tests
//!
//! The router is driven with `oneshot`; provider token and userinfo
//! endpoints are stubbed with wiremock.

mod common;

use axum::http::StatusCode;
use common::{app, body_string, config, location, query_params, start_login, Browser};
use oauth_login::config::ProviderSettings;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_google_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/google/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=good-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/google/userinfo"))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "u1",
            "name": "Alice",
            "email": "a@x.com"
        })))
        .mount(server)
        .await;
}

async fn login_with_google(browser: &mut Browser) {
    let state = start_login(browser, "google").await;
    let response = browser
        .get(&format!("/auth/google?code=good-code&state={state}"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile");
}

#[tokio::test]
async fn login_redirects_to_google_authorization_endpoint() {
    let server = MockServer::start().await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let response = browser.get("/login/google").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let url = location(&response);
    assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));

    let params = query_params(&url);
    assert_eq!(params["client_id"], "google-client");
    assert_eq!(params["redirect_uri"], "http://localhost:5000/auth/google");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "openid email profile");
    assert_eq!(params["prompt"], "select_account");
    assert_eq!(params["code_challenge_method"], "S256");
    assert!(!params["state"].is_empty());
    assert!(browser.cookie().is_some());
}

#[tokio::test]
async fn login_redirects_to_linkedin_authorization_endpoint() {
    let server = MockServer::start().await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let response = browser.get("/login/LinkedIn").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let url = location(&response);
    assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));

    let params = query_params(&url);
    assert_eq!(params["client_id"], "linkedin-client");
    assert_eq!(params["redirect_uri"], "http://localhost:5000/auth/linkedin");
    assert_eq!(params["scope"], "openid profile email");
    assert!(!params.contains_key("code_challenge"));
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let server = MockServer::start().await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    assert_eq!(browser.get("/login/github").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        browser.get("/auth/github?code=x&state=y").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn disabled_provider_flashes_and_redirects_home() {
    let server = MockServer::start().await;
    let mut config = config(&server.uri());
    config.oauth2.linkedin = ProviderSettings::default();
    let mut browser = Browser::new(app(config).await);

    let response = browser.get("/login/linkedin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("LinkedIn sign-in is not configured"));
    assert!(page.contains("flash-warning"));
    assert!(!page.contains("/login/linkedin"));
    assert!(page.contains("/login/google"));
}

#[tokio::test]
async fn successful_google_login_shows_profile() {
    let server = MockServer::start().await;
    mock_google_success(&server).await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    login_with_google(&mut browser).await;

    let response = browser.get("/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("Alice"));
    assert!(page.contains("a@x.com"));
    assert!(page.contains("u1"));
    assert!(page.contains("Google"));
    assert!(page.contains("Logged in with Google!"));

    // Flash is shown once
    let page = body_string(browser.get("/profile").await).await;
    assert!(!page.contains("Logged in with Google!"));

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("Welcome back, Alice"));
}

#[tokio::test]
async fn successful_linkedin_login_posts_client_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/linkedin/token"))
        .and(body_string_contains("client_id=linkedin-client"))
        .and(body_string_contains("client_secret=linkedin-secret"))
        .and(body_string_contains("code=li-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "li-token",
            "expires_in": 5184000
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/linkedin/userinfo"))
        .and(header("authorization", "Bearer li-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "li-42",
            "given_name": "Ada",
            "family_name": "Lovelace",
            "picture": "https://media.example.com/ada.png"
        })))
        .mount(&server)
        .await;

    let mut browser = Browser::new(app(config(&server.uri())).await);
    let state = start_login(&mut browser, "linkedin").await;

    let response = browser
        .get(&format!("/auth/linkedin?code=li-code&state={state}"))
        .await;
    assert_eq!(location(&response), "/profile");

    let page = body_string(browser.get("/profile").await).await;
    assert!(page.contains("Ada Lovelace"));
    assert!(page.contains("LinkedIn"));
    assert!(page.contains("No email shared"));
    assert!(page.contains("Logged in with LinkedIn!"));
}

#[tokio::test]
async fn provider_error_redirects_home_without_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let state = start_login(&mut browser, "google").await;
    let response = browser
        .get(&format!("/auth/google?error=access_denied&state={state}"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("Failed to log in with Google: Authorization denied: access_denied"));

    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn missing_code_is_denied() {
    let server = MockServer::start().await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let state = start_login(&mut browser, "google").await;
    let response = browser.get(&format!("/auth/google?state={state}")).await;
    assert_eq!(location(&response), "/");

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("No authorization code provided"));
}

#[tokio::test]
async fn token_endpoint_failure_redirects_home_without_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let state = start_login(&mut browser, "google").await;
    let response = browser
        .get(&format!("/auth/google?code=bad-code&state={state}"))
        .await;
    assert_eq!(location(&response), "/");

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("Failed to log in with Google"));
    assert!(page.contains("HTTP 400 Bad Request: invalid_grant"));

    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn userinfo_without_subject_fails_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/google/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Nobody"})))
        .mount(&server)
        .await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let state = start_login(&mut browser, "google").await;
    let response = browser
        .get(&format!("/auth/google?code=good-code&state={state}"))
        .await;
    assert_eq!(location(&response), "/");
    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn mismatched_state_never_reaches_token_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})))
        .expect(0)
        .mount(&server)
        .await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    start_login(&mut browser, "google").await;
    let response = browser
        .get("/auth/google?code=good-code&state=forged")
        .await;
    assert_eq!(location(&response), "/");

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("Invalid or expired login state"));
    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn callback_without_pending_login_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let response = browser.get("/auth/google?code=good-code&state=anything").await;
    assert_eq!(location(&response), "/");
    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn callback_for_other_provider_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let state = start_login(&mut browser, "google").await;
    let response = browser
        .get(&format!("/auth/linkedin?code=good-code&state={state}"))
        .await;
    assert_eq!(location(&response), "/");
    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn replayed_callback_keeps_existing_identity() {
    let server = MockServer::start().await;
    mock_google_success(&server).await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let state = start_login(&mut browser, "google").await;
    let callback = format!("/auth/google?code=good-code&state={state}");
    assert_eq!(location(&browser.get(&callback).await), "/profile");

    // The pending login was consumed; the replay fails but the user stays logged in
    assert_eq!(location(&browser.get(&callback).await), "/");

    let response = browser.get("/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Alice"));
}

#[tokio::test]
async fn logout_clears_identity() {
    let server = MockServer::start().await;
    mock_google_success(&server).await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    login_with_google(&mut browser).await;

    let response = browser.get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_string(browser.get("/").await).await;
    assert!(page.contains("been logged out."));
    assert!(page.contains("Sign in with Google"));

    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn logout_while_anonymous_is_a_no_op() {
    let server = MockServer::start().await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    let response = browser.get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(browser.cookie().is_none());

    let page = body_string(browser.get("/").await).await;
    assert!(!page.contains("logged out"));
}

#[tokio::test]
async fn tampered_cookie_is_anonymous() {
    let server = MockServer::start().await;
    mock_google_success(&server).await;
    let mut browser = Browser::new(app(config(&server.uri())).await);

    login_with_google(&mut browser).await;

    let mut cookie = browser.cookie().unwrap().to_string();
    let last = cookie.pop().unwrap();
    cookie.push(if last == 'A' { 'B' } else { 'A' });
    browser.set_cookie(&cookie);

    assert_eq!(location(&browser.get("/profile").await), "/");
}

#[tokio::test]
async fn garbage_cookie_is_anonymous() {
    let server = MockServer::start().await;
    let mut browser = Browser::new(app(config(&server.uri())).await);
    browser.set_cookie("not-a-session");

    assert_eq!(location(&browser.get("/profile").await), "/");

    let response = browser.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
}
