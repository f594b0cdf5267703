//! Shared wiremock helpers for client tests

#![allow(dead_code)]

use keyward_client::{EcsClient, AUTH_TOKEN_HEADER};
use keyward_core::{ControlPlaneConfig, SecureString};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_USER: &str = "root";
pub const TEST_PASSWORD: &str = "ChangeMe";

/// `Basic base64("root:ChangeMe")`
pub const BASIC_AUTH: &str = "Basic cm9vdDpDaGFuZ2VNZQ==";

pub fn config_for(server: &MockServer) -> ControlPlaneConfig {
    ControlPlaneConfig {
        url: server.uri(),
        username: TEST_USER.to_string(),
        password: SecureString::from(TEST_PASSWORD),
        skip_ssl: false,
    }
}

/// Login endpoint handing out `token` for a single login
pub async fn mock_login_once(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).insert_header(AUTH_TOKEN_HEADER, token))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Login endpoint that always hands out `token`
pub async fn mock_login(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header(AUTH_TOKEN_HEADER, token))
        .mount(server)
        .await;
}

pub async fn connected_client(server: &MockServer, token: &str) -> EcsClient {
    mock_login(server, token).await;
    EcsClient::connect(&config_for(server)).await.unwrap()
}
