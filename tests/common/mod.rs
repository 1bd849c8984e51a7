#![allow(dead_code)]

use std::sync::Arc;

use apigate::application::services::TokenService;
use apigate::config::Config;
use apigate::domain::entities::User;
use apigate::infrastructure::persistence::InMemoryUserRepository;
use apigate::routes::gateway_router;
use apigate::state::AppState;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::Value;

pub const GATEWAY_KEY: &str = "G";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Configuration with a small limit and proxy headers trusted, so tests
/// choose their client identity through `X-Forwarded-For`.
pub fn test_config(rate_limit: u32) -> Config {
    Config {
        gateway_key: GATEWAY_KEY.to_string(),
        rate_limit,
        behind_proxy: true,
        secret_key: "integration-test-secret".to_string(),
        ..Config::default()
    }
}

pub fn create_test_state(config: &Config) -> AppState {
    let hash = TokenService::hash_credential(ADMIN_PASSWORD).unwrap();
    let users = Arc::new(InMemoryUserRepository::new([User::new(
        ADMIN_USERNAME,
        hash,
    )]));

    AppState::from_config(config, users).unwrap()
}

pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(gateway_router(state)).unwrap()
}

pub fn gateway_key() -> HeaderName {
    HeaderName::from_static("x-api-gateway-key")
}

pub fn forwarded_for() -> HeaderName {
    HeaderName::from_static("x-forwarded-for")
}

pub fn header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap()
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Logs in as the seed user and returns `(access_token, refresh_token)`.
pub async fn login(server: &TestServer) -> (String, String) {
    let response = server
        .post("/login")
        .form(&[("username", ADMIN_USERNAME), ("password", ADMIN_PASSWORD)])
        .await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}
