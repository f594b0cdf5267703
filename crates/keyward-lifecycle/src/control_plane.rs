//! The remote operations the lifecycle engine depends on
//!
//! [`ControlPlane`] is the seam between the engine and the HTTP client. The
//! production implementation forwards to [`EcsClient`]; unit tests use the
//! generated `MockControlPlane`.

use async_trait::async_trait;
use keyward_client::{EcsClient, NativeUser, NativeUserInfo};
use keyward_core::{AccessKey, Result, SecureString};

/// Remote control-plane operations used by rotation, reconciliation and deletion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool>;

    /// Usernames of the namespace's IAM users
    async fn list_iam_users(&self, namespace: &str) -> Result<Vec<String>>;

    async fn create_iam_user(&self, namespace: &str, username: &str) -> Result<()>;

    /// Attach the baseline storage policy
    async fn attach_user_policy(&self, namespace: &str, username: &str) -> Result<()>;

    /// Create an access key; the result carries the secret
    async fn create_access_key(&self, namespace: &str, username: &str) -> Result<AccessKey>;

    /// Key metadata of a user; secrets are never returned
    async fn list_access_keys(&self, namespace: &str, username: &str) -> Result<Vec<AccessKey>>;

    /// Delete a key; an already deleted key is success
    async fn delete_access_key(
        &self,
        namespace: &str,
        username: &str,
        access_key_id: &str,
    ) -> Result<()>;

    /// Delete a user; an already deleted user is success
    async fn delete_iam_user(&self, namespace: &str, username: &str) -> Result<()>;

    async fn deactivate_namespace(&self, namespace: &str) -> Result<()>;

    /// Legacy object users of a namespace
    async fn list_native_users(&self, namespace: &str) -> Result<Vec<NativeUser>>;

    async fn native_user_info(&self, namespace: &str, userid: &str) -> Result<NativeUserInfo>;

    async fn update_account_password(&self, username: &str, password: &SecureString)
        -> Result<()>;
}

#[async_trait]
impl ControlPlane for EcsClient {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        EcsClient::namespace_exists(self, namespace).await
    }

    async fn list_iam_users(&self, namespace: &str) -> Result<Vec<String>> {
        Ok(EcsClient::list_iam_users(self, namespace)
            .await?
            .into_iter()
            .map(|u| u.user_name)
            .collect())
    }

    async fn create_iam_user(&self, namespace: &str, username: &str) -> Result<()> {
        EcsClient::create_iam_user(self, namespace, username).await
    }

    async fn attach_user_policy(&self, namespace: &str, username: &str) -> Result<()> {
        EcsClient::attach_user_policy(self, namespace, username).await
    }

    async fn create_access_key(&self, namespace: &str, username: &str) -> Result<AccessKey> {
        EcsClient::create_access_key(self, namespace, username).await
    }

    async fn list_access_keys(&self, namespace: &str, username: &str) -> Result<Vec<AccessKey>> {
        EcsClient::list_access_keys(self, namespace, username).await
    }

    async fn delete_access_key(
        &self,
        namespace: &str,
        username: &str,
        access_key_id: &str,
    ) -> Result<()> {
        EcsClient::delete_access_key(self, namespace, username, access_key_id).await
    }

    async fn delete_iam_user(&self, namespace: &str, username: &str) -> Result<()> {
        EcsClient::delete_iam_user(self, namespace, username).await
    }

    async fn deactivate_namespace(&self, namespace: &str) -> Result<()> {
        EcsClient::deactivate_namespace(self, namespace).await
    }

    async fn list_native_users(&self, namespace: &str) -> Result<Vec<NativeUser>> {
        EcsClient::list_native_users(self, namespace).await
    }

    async fn native_user_info(&self, namespace: &str, userid: &str) -> Result<NativeUserInfo> {
        EcsClient::native_user_info(self, namespace, userid).await
    }

    async fn update_account_password(
        &self,
        username: &str,
        password: &SecureString,
    ) -> Result<()> {
        EcsClient::update_account_password(self, username, password).await
    }
}
