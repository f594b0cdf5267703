//! Control-plane endpoint wrappers

use crate::client::EcsClient;
use crate::model::{
    AccountUpdate, CreateAccessKeyResponse, IamUser, ListAccessKeysResponse, ListUsersResponse,
    NamespaceEntry, NamespaceList, NativeUser, NativeUserInfo, NativeUserList,
};
use keyward_core::{AccessKey, Error, Result, SecureString};
use reqwest::Method;
use tracing::{debug, info};
use url::form_urlencoded;

/// Policy attached to every IAM user keyward creates
pub const BASELINE_POLICY_ARN: &str = "urn:ecs:iam:::policy/ECSS3FullAccess";

/// Build an `/iam?Action=...` path with url-encoded parameters
pub fn iam_path(action: &str, params: &[(&str, &str)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("Action", action);
    for (key, value) in params {
        query.append_pair(key, value);
    }
    format!("/iam?{}", query.finish())
}

/// Names interpolated into URL paths must not alter the path
fn path_segment(value: &str) -> Result<&str> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
        && !value.chars().all(|c| c == '.');
    if valid {
        Ok(value)
    } else {
        Err(Error::validation(format!(
            "'{}' cannot be used in a request path",
            value
        )))
    }
}

/// Treat a remote 404 as success for idempotent deletes
fn tolerate_not_found(result: Result<crate::client::ApiResponse>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.status() == Some(404) => Ok(()),
        Err(e) => Err(e),
    }
}

impl EcsClient {
    pub async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let path = format!(
            "/object/namespaces/namespace/{}.json",
            path_segment(namespace)?
        );
        match self.call(Method::GET, &path, None, None).await {
            Ok(_) => Ok(true),
            Err(e) if e.status() == Some(404) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceEntry>> {
        let list: NamespaceList = self
            .call_json(Method::GET, "/object/namespaces.json", None, None)
            .await?;
        Ok(list.namespace)
    }

    pub async fn deactivate_namespace(&self, namespace: &str) -> Result<()> {
        let path = format!(
            "/object/namespaces/namespace/{}/deactivate.json",
            path_segment(namespace)?
        );
        self.call(Method::POST, &path, None, None).await?;
        info!("Deactivated namespace {}", namespace);
        Ok(())
    }

    pub async fn list_iam_users(&self, namespace: &str) -> Result<Vec<IamUser>> {
        let response: ListUsersResponse = self
            .call_json(
                Method::GET,
                &iam_path("ListUsers", &[]),
                Some(namespace),
                None,
            )
            .await?;
        Ok(response.list_users_result.users)
    }

    pub async fn create_iam_user(&self, namespace: &str, username: &str) -> Result<()> {
        let path = iam_path("CreateUser", &[("UserName", username)]);
        self.call(Method::POST, &path, Some(namespace), None).await?;
        debug!(namespace = %namespace, "Created IAM user {}", username);
        Ok(())
    }

    /// Attach [`BASELINE_POLICY_ARN`] to a user
    pub async fn attach_user_policy(&self, namespace: &str, username: &str) -> Result<()> {
        let path = iam_path(
            "AttachUserPolicy",
            &[("PolicyArn", BASELINE_POLICY_ARN), ("UserName", username)],
        );
        self.call(Method::POST, &path, Some(namespace), None).await?;
        debug!(namespace = %namespace, "Attached baseline policy to {}", username);
        Ok(())
    }

    /// Create an access key; the returned key is the only copy of its secret
    pub async fn create_access_key(&self, namespace: &str, username: &str) -> Result<AccessKey> {
        let path = iam_path("CreateAccessKey", &[("UserName", username)]);
        let response: CreateAccessKeyResponse = self
            .call_json(Method::POST, &path, Some(namespace), None)
            .await?;
        let key = response
            .create_access_key_result
            .access_key
            .into_created_key()?;
        debug!(namespace = %namespace, "Created access key {} for {}", key.access_key_id, username);
        Ok(key)
    }

    pub async fn list_access_keys(&self, namespace: &str, username: &str) -> Result<Vec<AccessKey>> {
        let path = iam_path("ListAccessKeys", &[("UserName", username)]);
        let response: ListAccessKeysResponse = self
            .call_json(Method::POST, &path, Some(namespace), None)
            .await?;
        Ok(response
            .list_access_keys_result
            .access_key_metadata
            .into_iter()
            .map(|k| k.into_metadata())
            .collect())
    }

    /// Delete an access key; an already deleted key is not an error
    pub async fn delete_access_key(
        &self,
        namespace: &str,
        username: &str,
        access_key_id: &str,
    ) -> Result<()> {
        let path = iam_path(
            "DeleteAccessKey",
            &[("UserName", username), ("AccessKeyId", access_key_id)],
        );
        tolerate_not_found(self.call(Method::POST, &path, Some(namespace), None).await)?;
        debug!(namespace = %namespace, "Deleted access key {} of {}", access_key_id, username);
        Ok(())
    }

    /// Delete an IAM user; an already deleted user is not an error
    pub async fn delete_iam_user(&self, namespace: &str, username: &str) -> Result<()> {
        let path = iam_path("DeleteUser", &[("UserName", username)]);
        tolerate_not_found(self.call(Method::POST, &path, Some(namespace), None).await)?;
        debug!(namespace = %namespace, "Deleted IAM user {}", username);
        Ok(())
    }

    pub async fn list_native_users(&self, namespace: &str) -> Result<Vec<NativeUser>> {
        let path = format!("/object/users/{}.json", path_segment(namespace)?);
        let list: NativeUserList = self.call_json(Method::GET, &path, None, None).await?;
        Ok(list.blobuser)
    }

    pub async fn native_user_info(&self, namespace: &str, userid: &str) -> Result<NativeUserInfo> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("namespace", namespace)
            .finish();
        let path = format!(
            "/object/users/{}/info.json?{}",
            path_segment(userid)?,
            query
        );
        self.call_json(Method::GET, &path, None, None).await
    }

    /// Change the password of a management account
    pub async fn update_account_password(
        &self,
        username: &str,
        password: &SecureString,
    ) -> Result<()> {
        let path = format!("/vdc/users/{}.json", path_segment(username)?);
        let body = serde_json::to_value(AccountUpdate {
            password: password.expose(),
            is_system_admin: "true",
            is_system_monitor: "false",
            is_security_admin: "false",
        })?;
        self.call(Method::PUT, &path, None, Some(&body)).await?;
        info!("Updated password of management account {}", username);
        Ok(())
    }
}
