//! Wire types of the control-plane API

use keyward_core::{AccessKey, Error, Result, SecureString};
use serde::{Deserialize, Serialize};

/// Entry of `GET /object/namespaces.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamespaceList {
    #[serde(default)]
    pub namespace: Vec<NamespaceEntry>,
}

/// IAM user as listed by `ListUsers`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IamUser {
    #[serde(rename = "UserName")]
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListUsersResponse {
    pub list_users_result: ListUsersResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListUsersResult {
    #[serde(default)]
    pub users: Vec<IamUser>,
}

/// Access key as the IAM API reports it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireAccessKey {
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    pub create_date: String,
}

impl WireAccessKey {
    /// Convert a freshly created key; it must carry its secret
    pub fn into_created_key(self) -> Result<AccessKey> {
        let secret = self
            .secret_access_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::data(format!(
                    "CreateAccessKey returned key {} without a secret",
                    self.access_key_id
                ))
            })?;
        Ok(AccessKey {
            access_key_id: self.access_key_id,
            secret_access_key: Some(SecureString::new(secret)),
            create_date: self.create_date,
        })
    }

    /// Convert listed key metadata; secrets are never listed
    pub fn into_metadata(self) -> AccessKey {
        AccessKey {
            access_key_id: self.access_key_id,
            secret_access_key: None,
            create_date: self.create_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateAccessKeyResponse {
    pub create_access_key_result: CreateAccessKeyResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateAccessKeyResult {
    pub access_key: WireAccessKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListAccessKeysResponse {
    pub list_access_keys_result: ListAccessKeysResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListAccessKeysResult {
    #[serde(default, alias = "AccessKeys")]
    pub access_key_metadata: Vec<WireAccessKey>,
}

/// Legacy object user, listed by `GET /object/users/{namespace}.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NativeUser {
    pub userid: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NativeUserList {
    #[serde(default)]
    pub blobuser: Vec<NativeUser>,
}

/// Detail of a legacy object user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NativeUserInfo {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub locked: bool,
}

/// Body of `PUT /vdc/users/{username}.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountUpdate<'a> {
    pub password: &'a str,
    pub is_system_admin: &'a str,
    pub is_system_monitor: &'a str,
    pub is_security_admin: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_users() {
        let body = r#"{"ListUsersResult":{"Users":[{"UserName":"alice","Path":"/"},{"UserName":"bob"}],"IsTruncated":false}}"#;
        let parsed: ListUsersResponse = serde_json::from_str(body).unwrap();
        let names: Vec<_> = parsed
            .list_users_result
            .users
            .into_iter()
            .map(|u| u.user_name)
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_parse_list_access_keys_either_field_name() {
        let metadata = r#"{"ListAccessKeysResult":{"AccessKeyMetadata":[{"AccessKeyId":"k1","CreateDate":"2023-01-01T00:00:00Z","Status":"Active"}]}}"#;
        let legacy = r#"{"ListAccessKeysResult":{"AccessKeys":[{"AccessKeyId":"k1","CreateDate":"2023-01-01T00:00:00Z"}]}}"#;
        for body in [metadata, legacy] {
            let parsed: ListAccessKeysResponse = serde_json::from_str(body).unwrap();
            let keys = parsed.list_access_keys_result.access_key_metadata;
            assert_eq!(keys.len(), 1);
            assert_eq!(keys[0].access_key_id, "k1");
        }
    }

    #[test]
    fn test_created_key_requires_secret() {
        let key = WireAccessKey {
            access_key_id: "k1".to_string(),
            secret_access_key: None,
            create_date: "2023-01-01T00:00:00Z".to_string(),
        };
        assert!(matches!(key.into_created_key(), Err(Error::Data { .. })));
    }

    #[test]
    fn test_account_update_field_names() {
        let body = serde_json::to_value(AccountUpdate {
            password: "pw",
            is_system_admin: "true",
            is_system_monitor: "false",
            is_security_admin: "false",
        })
        .unwrap();
        assert_eq!(body["isSystemAdmin"], "true");
        assert_eq!(body["isSecurityAdmin"], "false");
        assert_eq!(body["password"], "pw");
    }
}
