//! Operation table and typed request/response DTOs
//!
//! Every operation has a stable name (`role/rotate`, `namespace/migrate`, ...)
//! and a typed request. Requests are decoded from JSON with
//! [`Request::parse`] and normalized by [`Request::validate`], the single
//! place where user input is checked; the engine below trusts its inputs.

use keyward_core::types::ROLE_NAME_SEPARATOR;
use keyward_core::{ControlPlaneConfig, Error, Result, Role, SecureString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder shown instead of the account password
pub const MASKED: &str = "<masked>";

/// Names of every dispatchable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ConfigRead,
    ConfigWrite,
    ConfigRotateRoot,
    RoleRead,
    RoleList,
    RoleWrite,
    RoleDelete,
    RoleRotate,
    CredsRead,
    IamUserOnboard,
    NamespaceOnboard,
    NamespaceMigrate,
    NamespaceList,
    NamespaceDelete,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Operation::ConfigRead,
        Operation::ConfigWrite,
        Operation::ConfigRotateRoot,
        Operation::RoleRead,
        Operation::RoleList,
        Operation::RoleWrite,
        Operation::RoleDelete,
        Operation::RoleRotate,
        Operation::CredsRead,
        Operation::IamUserOnboard,
        Operation::NamespaceOnboard,
        Operation::NamespaceMigrate,
        Operation::NamespaceList,
        Operation::NamespaceDelete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ConfigRead => "config/read",
            Operation::ConfigWrite => "config/write",
            Operation::ConfigRotateRoot => "config/rotate-root",
            Operation::RoleRead => "role/read",
            Operation::RoleList => "role/list",
            Operation::RoleWrite => "role/write",
            Operation::RoleDelete => "role/delete",
            Operation::RoleRotate => "role/rotate",
            Operation::CredsRead => "creds/read",
            Operation::IamUserOnboard => "iam-user/onboard",
            Operation::NamespaceOnboard => "namespace/onboard",
            Operation::NamespaceMigrate => "namespace/migrate",
            Operation::NamespaceList => "namespace/list",
            Operation::NamespaceDelete => "namespace/delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::validation(format!("unknown operation '{}'", s)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigWriteRequest {
    pub url: String,
    pub username: String,
    pub password: SecureString,
    #[serde(default)]
    pub skip_ssl: bool,
}

impl From<ConfigWriteRequest> for ControlPlaneConfig {
    fn from(req: ConfigWriteRequest) -> Self {
        ControlPlaneConfig {
            url: req.url,
            username: req.username,
            password: req.password,
            skip_ssl: req.skip_ssl,
        }
    }
}

/// Request naming a single role
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleNameRequest {
    pub name: String,
}

/// Register a role; the IAM username is the part of `name` after the first `_`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleWriteRequest {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub max_ttl: Option<u64>,
}

impl RoleWriteRequest {
    /// IAM username encoded in the role name
    pub fn username(&self) -> &str {
        self.name
            .split_once(ROLE_NAME_SEPARATOR)
            .map(|(_, user)| user)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamUserOnboardRequest {
    pub namespace: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceOnboardRequest {
    pub namespace: String,
    pub username: String,
    /// Role name to store under instead of `<namespace>_<username>`
    #[serde(default)]
    pub name: Option<String>,
}

/// Request naming a single namespace
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceRequest {
    pub namespace: String,
}

/// A decoded operation with its arguments
#[derive(Debug, Clone)]
pub enum Request {
    ConfigRead,
    ConfigWrite(ConfigWriteRequest),
    ConfigRotateRoot,
    RoleRead(RoleNameRequest),
    RoleList,
    RoleWrite(RoleWriteRequest),
    RoleDelete(RoleNameRequest),
    RoleRotate(RoleNameRequest),
    CredsRead(RoleNameRequest),
    IamUserOnboard(IamUserOnboardRequest),
    NamespaceOnboard(NamespaceOnboardRequest),
    NamespaceMigrate(NamespaceRequest),
    NamespaceList,
    NamespaceDelete(NamespaceRequest),
}

fn decode<T: DeserializeOwned>(operation: Operation, data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| Error::validation(format!("invalid request for {}: {}", operation, e)))
}

/// Lowercase a required field, rejecting blank values
fn normalize(field: &str, value: &mut String) -> Result<()> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    *value = normalized;
    Ok(())
}

/// Namespaces prefix role names, so they cannot contain the separator
fn normalize_namespace(value: &mut String) -> Result<()> {
    normalize("namespace", value)?;
    if value.contains(ROLE_NAME_SEPARATOR) {
        return Err(Error::validation(format!(
            "namespace '{}' must not contain '{}'",
            value, ROLE_NAME_SEPARATOR
        )));
    }
    Ok(())
}

impl Request {
    /// Decode the arguments of `operation`; operations without arguments
    /// accept `null` or an empty object
    pub fn parse(operation: Operation, data: serde_json::Value) -> Result<Self> {
        let request = match operation {
            Operation::ConfigRead => Request::ConfigRead,
            Operation::ConfigWrite => Request::ConfigWrite(decode(operation, data)?),
            Operation::ConfigRotateRoot => Request::ConfigRotateRoot,
            Operation::RoleRead => Request::RoleRead(decode(operation, data)?),
            Operation::RoleList => Request::RoleList,
            Operation::RoleWrite => Request::RoleWrite(decode(operation, data)?),
            Operation::RoleDelete => Request::RoleDelete(decode(operation, data)?),
            Operation::RoleRotate => Request::RoleRotate(decode(operation, data)?),
            Operation::CredsRead => Request::CredsRead(decode(operation, data)?),
            Operation::IamUserOnboard => Request::IamUserOnboard(decode(operation, data)?),
            Operation::NamespaceOnboard => Request::NamespaceOnboard(decode(operation, data)?),
            Operation::NamespaceMigrate => Request::NamespaceMigrate(decode(operation, data)?),
            Operation::NamespaceList => Request::NamespaceList,
            Operation::NamespaceDelete => Request::NamespaceDelete(decode(operation, data)?),
        };
        Ok(request)
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::ConfigRead => Operation::ConfigRead,
            Request::ConfigWrite(_) => Operation::ConfigWrite,
            Request::ConfigRotateRoot => Operation::ConfigRotateRoot,
            Request::RoleRead(_) => Operation::RoleRead,
            Request::RoleList => Operation::RoleList,
            Request::RoleWrite(_) => Operation::RoleWrite,
            Request::RoleDelete(_) => Operation::RoleDelete,
            Request::RoleRotate(_) => Operation::RoleRotate,
            Request::CredsRead(_) => Operation::CredsRead,
            Request::IamUserOnboard(_) => Operation::IamUserOnboard,
            Request::NamespaceOnboard(_) => Operation::NamespaceOnboard,
            Request::NamespaceMigrate(_) => Operation::NamespaceMigrate,
            Request::NamespaceList => Operation::NamespaceList,
            Request::NamespaceDelete(_) => Operation::NamespaceDelete,
        }
    }

    /// Check required fields and lowercase names
    ///
    /// Role names, namespaces and usernames are case-insensitive and stored
    /// lowercase. That includes an explicit role name on `namespace/onboard`,
    /// so every stored role can be looked up by the other operations.
    pub fn validate(mut self) -> Result<Self> {
        match &mut self {
            Request::ConfigRead
            | Request::ConfigRotateRoot
            | Request::RoleList
            | Request::NamespaceList => {}
            Request::ConfigWrite(req) => {
                req.url = req.url.trim().trim_end_matches('/').to_string();
                req.username = req.username.trim().to_string();
                ControlPlaneConfig::from(req.clone()).validate()?;
            }
            Request::RoleRead(req)
            | Request::RoleDelete(req)
            | Request::RoleRotate(req)
            | Request::CredsRead(req) => normalize("name", &mut req.name)?,
            Request::RoleWrite(req) => {
                normalize("name", &mut req.name)?;
                normalize_namespace(&mut req.namespace)?;
                if req.username().is_empty() {
                    return Err(Error::validation(format!(
                        "role name '{}' must have the form <namespace>{}<username>",
                        req.name, ROLE_NAME_SEPARATOR
                    )));
                }
                if let (Some(ttl), Some(max_ttl)) = (req.ttl, req.max_ttl) {
                    if max_ttl > 0 && ttl > max_ttl {
                        return Err(Error::validation(format!(
                            "ttl {} exceeds max_ttl {}",
                            ttl, max_ttl
                        )));
                    }
                }
            }
            Request::IamUserOnboard(req) => {
                normalize_namespace(&mut req.namespace)?;
                normalize("username", &mut req.username)?;
            }
            Request::NamespaceOnboard(req) => {
                normalize_namespace(&mut req.namespace)?;
                normalize("username", &mut req.username)?;
                req.name = req
                    .name
                    .take()
                    .map(|n| n.trim().to_lowercase())
                    .filter(|n| !n.is_empty());
            }
            Request::NamespaceMigrate(req) | Request::NamespaceDelete(req) => {
                normalize_namespace(&mut req.namespace)?
            }
        }
        Ok(self)
    }
}

/// Config as shown to users, password masked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigView {
    pub url: String,
    pub username: String,
    pub password: &'static str,
    pub skip_ssl: bool,
}

impl From<&ControlPlaneConfig> for ConfigView {
    fn from(config: &ControlPlaneConfig) -> Self {
        Self {
            url: config.url.clone(),
            username: config.username.clone(),
            password: MASKED,
            skip_ssl: config.skip_ssl,
        }
    }
}

/// Access key as shown to users; secrets are never part of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyView {
    pub access_key_id: String,
    pub create_date: String,
    pub has_secret: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleView {
    pub name: String,
    pub namespace: String,
    pub username: String,
    pub state: String,
    pub access_keys: Vec<KeyView>,
    pub ttl: u64,
    pub max_ttl: u64,
}

impl From<&Role> for RoleView {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            namespace: role.namespace.clone(),
            username: role.username.clone(),
            state: describe_state(role),
            access_keys: role
                .access_keys
                .iter()
                .map(|k| KeyView {
                    access_key_id: k.access_key_id.clone(),
                    create_date: k.create_date.clone(),
                    has_secret: k.has_secret(),
                })
                .collect(),
            ttl: role.ttl,
            max_ttl: role.max_ttl,
        }
    }
}

/// Credentials handed to consumers: the newest key and its lease
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: SecureString,
    pub namespace: String,
    pub username: String,
    pub ttl: u64,
    pub max_ttl: u64,
}

impl Credentials {
    /// Fails when the newest key's secret is not known
    pub fn from_role(role: &Role) -> Result<Self> {
        let key = role.newest_key()?;
        let secret = key.secret_access_key.clone().ok_or_else(|| {
            Error::data(format!(
                "secret of access key {} in role {} is not known, rotate the role",
                key.access_key_id, role.name
            ))
        })?;
        Ok(Self {
            access_key_id: key.access_key_id.clone(),
            secret_access_key: secret,
            namespace: role.namespace.clone(),
            username: role.username.clone(),
            ttl: role.ttl,
            max_ttl: role.max_ttl,
        })
    }
}

/// Result of a dispatched operation
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Config(ConfigView),
    Role(RoleView),
    Credentials(Credentials),
    Names(Vec<String>),
    Migrated {
        namespace: String,
        roles: Vec<String>,
    },
    PasswordRotated {
        username: String,
    },
    Deleted {
        name: String,
    },
    Empty,
}

impl Response {
    pub fn role(role: &Role) -> Self {
        Response::Role(RoleView::from(role))
    }
}

/// Key state for display, `invalid` for corrupt records
pub fn describe_state(role: &Role) -> String {
    role.state()
        .map(|s| s.to_string())
        .unwrap_or_else(|_| "invalid".to_string())
}
