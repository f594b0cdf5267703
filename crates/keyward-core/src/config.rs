//! Control-plane configuration
//!
//! Loaded with the following precedence (low to high):
//! 1. Config file (`~/.keyward/config.yaml`)
//! 2. Environment variables (`KEYWARD_*` prefix)
//! 3. Explicit writes through [`ConfigStore::save`]

use crate::error::{Error, Result};
use crate::security::SecureString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// Environment variable overriding the control-plane URL
pub const ENV_URL: &str = "KEYWARD_URL";
/// Environment variable overriding the account username
pub const ENV_USERNAME: &str = "KEYWARD_USERNAME";
/// Environment variable overriding the account password
pub const ENV_PASSWORD: &str = "KEYWARD_PASSWORD";
/// Environment variable overriding TLS verification
pub const ENV_SKIP_SSL: &str = "KEYWARD_SKIP_SSL";

/// Config file name inside the state directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Credentials and endpoint of the control-plane account keyward logs in with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    /// Base URL of the management API, e.g. `https://ecs.example.com:4443`
    pub url: String,
    pub username: String,
    pub password: SecureString,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub skip_ssl: bool,
}

impl ControlPlaneConfig {
    /// Check that every field holds a usable value
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::validation("url is required"));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::validation(format!(
                "url must start with http:// or https://, got '{}'",
                self.url
            )));
        }
        if self.username.trim().is_empty() {
            return Err(Error::validation("username is required"));
        }
        if self.password.is_empty() {
            return Err(Error::validation("password is required"));
        }
        Ok(())
    }
}

/// Config as found on disk, every field optional until env overrides apply
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<SecureString>,
    skip_ssl: Option<bool>,
}

impl PartialConfig {
    fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.skip_ssl.is_none()
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(ENV_URL) {
            self.url = Some(url);
        }
        if let Ok(username) = env::var(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Ok(password) = env::var(ENV_PASSWORD) {
            self.password = Some(SecureString::new(password));
        }
        if let Ok(skip) = env::var(ENV_SKIP_SSL) {
            self.skip_ssl = Some(skip == "true" || skip == "1");
        }
        self
    }

    fn finish(self) -> Result<Option<ControlPlaneConfig>> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push("url");
        }
        if self.username.is_none() {
            missing.push("username");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        match (self.url, self.username, self.password) {
            (Some(url), Some(username), Some(password)) => Ok(Some(ControlPlaneConfig {
                url,
                username,
                password,
                skip_ssl: self.skip_ssl.unwrap_or(false),
            })),
            _ => Err(Error::config(format!(
                "incomplete configuration, missing: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Durable home of the control-plane configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration; `None` when nothing has been configured
    async fn load(&self) -> Result<Option<ControlPlaneConfig>>;

    /// Persist the configuration
    async fn save(&self, config: &ControlPlaneConfig) -> Result<()>;
}

/// YAML file backed config store with environment overrides
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Create a store reading `config.yaml` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<ControlPlaneConfig>> {
        let partial = if fs::try_exists(&self.path).await? {
            let content = fs::read_to_string(&self.path).await?;
            debug!("Loaded configuration from {}", self.path.display());
            serde_yaml_ng::from_str::<Option<PartialConfig>>(&content)
                .map_err(|e| {
                    Error::config(format!("Failed to parse {}: {}", self.path.display(), e))
                })?
                .unwrap_or_default()
        } else {
            PartialConfig::default()
        };

        partial.apply_env_overrides().finish()
    }

    async fn save(&self, config: &ControlPlaneConfig) -> Result<()> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_yaml_ng::to_string(config)?;
        fs::write(&self.path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

/// In-memory config store
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: RwLock<Option<ControlPlaneConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ControlPlaneConfig) -> Self {
        Self {
            config: RwLock::new(Some(config)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<ControlPlaneConfig>> {
        Ok(self.config.read().await.clone())
    }

    async fn save(&self, config: &ControlPlaneConfig) -> Result<()> {
        config.validate()?;
        *self.config.write().await = Some(config.clone());
        Ok(())
    }
}

/// Default state directory (`~/.keyward`)
pub fn default_state_dir() -> Result<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        return Ok(PathBuf::from(home).join(".keyward"));
    }
    dirs::home_dir()
        .map(|home| home.join(".keyward"))
        .ok_or_else(|| Error::config("Could not determine home directory"))
}
