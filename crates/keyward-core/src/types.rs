//! Role and access key types
//!
//! A [`Role`] is the persisted credential record binding a namespace/username
//! pair to its live access keys. The control plane caps every identity at two
//! keys, so a role always holds one or two of them; which one is "newest" is
//! decided by the keys' RFC 3339 creation dates, never by position.

use crate::error::{Error, Result};
use crate::security::SecureString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of live access keys per identity
pub const MAX_KEYS_PER_IDENTITY: usize = 2;

/// Separator between namespace and username in default role names
pub const ROLE_NAME_SEPARATOR: char = '_';

/// Build the default role name for a namespace/username pair
///
/// Role names are store keys and always lowercase, whatever the case of the
/// remote username.
pub fn role_name(namespace: &str, username: &str) -> String {
    format!("{}{}{}", namespace, ROLE_NAME_SEPARATOR, username).to_lowercase()
}

/// Namespace part of a role name (text before the first separator)
pub fn namespace_of(role_name: &str) -> &str {
    role_name
        .split_once(ROLE_NAME_SEPARATOR)
        .map(|(ns, _)| ns)
        .unwrap_or(role_name)
}

/// An access key pair bound to an IAM user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    pub access_key_id: String,

    /// Only present for keys created by this system; the control plane
    /// returns a secret exactly once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<SecureString>,

    /// RFC 3339 creation timestamp as reported by the control plane
    pub create_date: String,
}

impl AccessKey {
    /// Parse the creation date
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.create_date)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                Error::data(format!(
                    "access key {} has an unparsable create date '{}': {}",
                    self.access_key_id, self.create_date, e
                ))
            })
    }

    /// Whether the secret for this key is still known
    pub fn has_secret(&self) -> bool {
        self.secret_access_key.is_some()
    }
}

/// Key-set state of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    OneKey,
    TwoKeys,
}

impl std::fmt::Display for KeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyState::OneKey => write!(f, "one-key"),
            KeyState::TwoKeys => write!(f, "two-keys"),
        }
    }
}

/// The persisted credential record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub namespace: String,
    pub username: String,
    pub access_keys: Vec<AccessKey>,

    /// Default lease in seconds (0 = host default)
    #[serde(default)]
    pub ttl: u64,

    /// Maximum lease in seconds (0 = host default)
    #[serde(default)]
    pub max_ttl: u64,
}

impl Role {
    /// Create a role holding a single freshly created key
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        username: impl Into<String>,
        key: AccessKey,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            username: username.into(),
            access_keys: vec![key],
            ttl: 0,
            max_ttl: 0,
        }
    }

    /// Current key-set state; any other key count is corrupt data
    pub fn state(&self) -> Result<KeyState> {
        match self.access_keys.len() {
            1 => Ok(KeyState::OneKey),
            2 => Ok(KeyState::TwoKeys),
            n => Err(Error::data(format!(
                "role {} holds {} access keys, expected 1 or 2",
                self.name, n
            ))),
        }
    }

    /// Indexes of the (oldest, newest) key when two keys are present
    ///
    /// Fails with a data error when either timestamp cannot be parsed or both
    /// are identical, since there is then no defensible order.
    pub fn key_order(&self) -> Result<(usize, usize)> {
        if self.state()? != KeyState::TwoKeys {
            return Err(Error::data(format!(
                "role {} holds a single access key, no order to resolve",
                self.name
            )));
        }
        let first = self.access_keys[0].created_at()?;
        let second = self.access_keys[1].created_at()?;
        if first < second {
            Ok((0, 1))
        } else if second < first {
            Ok((1, 0))
        } else {
            Err(Error::data(format!(
                "access keys of role {} share the create date {}",
                self.name, self.access_keys[0].create_date
            )))
        }
    }

    /// The key currently advertised to consumers
    pub fn newest_key(&self) -> Result<&AccessKey> {
        match self.state()? {
            KeyState::OneKey => Ok(&self.access_keys[0]),
            KeyState::TwoKeys => {
                let (_, newest) = self.key_order()?;
                Ok(&self.access_keys[newest])
            }
        }
    }

    /// The key a rotation would evict
    pub fn oldest_key(&self) -> Result<&AccessKey> {
        let (oldest, _) = self.key_order()?;
        Ok(&self.access_keys[oldest])
    }

    pub fn key_ids(&self) -> Vec<&str> {
        self.access_keys
            .iter()
            .map(|k| k.access_key_id.as_str())
            .collect()
    }
}
