//! Mock control plane for lifecycle integration tests

#![allow(dead_code)]

use keyward_client::{EcsClient, AUTH_TOKEN_HEADER, NAMESPACE_HEADER};
use keyward_core::{ControlPlaneConfig, SecureString};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NAMESPACE: &str = "acct1";

pub fn config_for(server: &MockServer) -> ControlPlaneConfig {
    ControlPlaneConfig {
        url: server.uri(),
        username: "root".to_string(),
        password: SecureString::from("ChangeMe"),
        skip_ssl: false,
    }
}

/// Start a server that accepts logins and knows namespace `acct1`
pub async fn control_plane() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header(AUTH_TOKEN_HEADER, "tok"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/object/namespaces/namespace/{}.json", NAMESPACE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": NAMESPACE})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/object/namespaces/namespace/ghost.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

pub async fn client_for(server: &MockServer) -> EcsClient {
    EcsClient::connect(&config_for(server)).await.unwrap()
}

fn iam(action: &str) -> wiremock::MockBuilder {
    Mock::given(path("/iam"))
        .and(query_param("Action", action))
        .and(header(NAMESPACE_HEADER, NAMESPACE))
}

pub async fn mount_iam_users(server: &MockServer, users: &[&str]) {
    let users: Vec<_> = users.iter().map(|u| json!({"UserName": u})).collect();
    iam("ListUsers")
        .and(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ListUsersResult": {"Users": users}})),
        )
        .mount(server)
        .await;
}

/// Listed keys of `user` as `(id, create_date)` pairs
pub async fn mount_access_keys(server: &MockServer, user: &str, keys: &[(&str, &str)]) {
    let keys: Vec<_> = keys
        .iter()
        .map(|(id, date)| json!({"AccessKeyId": id, "CreateDate": date, "Status": "Active"}))
        .collect();
    iam("ListAccessKeys")
        .and(query_param("UserName", user))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"ListAccessKeysResult": {"AccessKeyMetadata": keys}}),
        ))
        .mount(server)
        .await;
}

/// Next key created for `user`
pub async fn mount_new_key(server: &MockServer, user: &str, id: &str, date: &str) {
    iam("CreateAccessKey")
        .and(method("POST"))
        .and(query_param("UserName", user))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CreateAccessKeyResult": {"AccessKey": {
                "AccessKeyId": id,
                "SecretAccessKey": format!("{}-secret", id),
                "CreateDate": date,
                "UserName": user,
                "Status": "Active"
            }}
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Accept CreateUser and AttachUserPolicy for any user
pub async fn mount_user_creation(server: &MockServer) {
    for action in ["CreateUser", "AttachUserPolicy"] {
        iam(action)
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }
}

/// Accept DeleteAccessKey and DeleteUser for any user
pub async fn mount_deletions(server: &MockServer) {
    for action in ["DeleteAccessKey", "DeleteUser"] {
        iam(action)
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }
}

/// Legacy users as `(userid, display name)` pairs
pub async fn mount_native_users(server: &MockServer, users: &[(&str, &str)]) {
    let listed: Vec<_> = users
        .iter()
        .map(|(id, _)| json!({"userid": id, "namespace": NAMESPACE}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/object/users/{}.json", NAMESPACE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"blobuser": listed})))
        .mount(server)
        .await;
    for (id, name) in users {
        Mock::given(method("GET"))
            .and(path(format!("/object/users/{}/info.json", id)))
            .and(query_param("namespace", NAMESPACE))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"name": name, "namespace": NAMESPACE, "locked": false}),
            ))
            .mount(server)
            .await;
    }
}

/// IAM actions received so far, in order, as `(action, UserName)` pairs
pub async fn iam_calls(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/iam")
        .map(|r| {
            let param = |name: &str| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default()
            };
            (param("Action"), param("UserName"))
        })
        .collect()
}

pub async fn count_action(server: &MockServer, action: &str) -> usize {
    iam_calls(server)
        .await
        .iter()
        .filter(|(a, _)| a == action)
        .count()
}
