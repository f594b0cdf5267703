//! Role storage
//!
//! The lifecycle engine persists roles through the [`RoleStore`] trait. The
//! file-backed store keeps one JSON document per role; the memory store is
//! used for embedding and tests.

use crate::error::{Error, Result};
use crate::types::Role;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// Durable keyed storage for roles
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Role>>;

    async fn put(&self, key: &str, role: &Role) -> Result<()>;

    /// Keys starting with `prefix`, sorted
    async fn list_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove a role; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Check a role name against the store's key alphabet
///
/// Role keys end up in file names, so they are limited to ASCII letters,
/// digits and `_-.@`, and cannot start with a dot.
pub fn check_role_name(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid role name '{}'", key)))
    }
}

/// In-memory role store
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    roles: RwLock<BTreeMap<String, Role>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.roles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.roles.read().await.is_empty()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get(&self, key: &str) -> Result<Option<Role>> {
        check_role_name(key)?;
        Ok(self.roles.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, role: &Role) -> Result<()> {
        check_role_name(key)?;
        self.roles
            .write()
            .await
            .insert(key.to_string(), role.clone());
        Ok(())
    }

    async fn list_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .roles
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_role_name(key)?;
        self.roles.write().await.remove(key);
        Ok(())
    }
}

/// Directory of `<key>.json` documents
#[derive(Debug, Clone)]
pub struct FileRoleStore {
    dir: PathBuf,
}

impl FileRoleStore {
    /// Open (and create if needed) a role directory
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !fs::try_exists(&dir).await? {
            fs::create_dir_all(&dir).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create role directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700)).await?;
            }

            debug!("Created role directory: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl RoleStore for FileRoleStore {
    async fn get(&self, key: &str) -> Result<Option<Role>> {
        check_role_name(key)?;
        let path = self.path_for(key);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let data = fs::read(&path).await?;
        let role = serde_json::from_slice(&data).map_err(|e| {
            Error::storage(format!("Failed to parse role {}: {}", path.display(), e))
        })?;
        Ok(Some(role))
    }

    async fn put(&self, key: &str, role: &Role) -> Result<()> {
        check_role_name(key)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        let data = serde_json::to_vec_pretty(role)?;

        fs::write(&tmp, data).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }
        fs::rename(&tmp, &path).await?;

        debug!("Stored role {}", key);
        Ok(())
    }

    async fn list_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(".json") {
                if key.starts_with(prefix) {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_role_name(key)?;
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!("Deleted role {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessKey;
    use tempfile::TempDir;

    fn role(name: &str) -> Role {
        let (ns, user) = name.split_once('_').unwrap();
        Role::new(
            name,
            ns,
            user,
            AccessKey {
                access_key_id: format!("AKID-{}", user),
                secret_access_key: Some("s".into()),
                create_date: "2023-01-01T00:00:00Z".to_string(),
            },
        )
    }

    async fn exercise(store: &dyn RoleStore) {
        assert!(store.get("acct1_alice").await.unwrap().is_none());

        store.put("acct1_alice", &role("acct1_alice")).await.unwrap();
        store.put("acct1_bob", &role("acct1_bob")).await.unwrap();
        store.put("acct2_carol", &role("acct2_carol")).await.unwrap();

        let fetched = store.get("acct1_alice").await.unwrap().unwrap();
        assert_eq!(fetched, role("acct1_alice"));

        assert_eq!(
            store.list_with_prefix("acct1_").await.unwrap(),
            vec!["acct1_alice".to_string(), "acct1_bob".to_string()]
        );
        assert_eq!(store.list_with_prefix("").await.unwrap().len(), 3);

        store.delete("acct1_alice").await.unwrap();
        store.delete("acct1_alice").await.unwrap();
        assert!(store.get("acct1_alice").await.unwrap().is_none());
        assert_eq!(
            store.list_with_prefix("acct1_").await.unwrap(),
            vec!["acct1_bob".to_string()]
        );
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryRoleStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = TempDir::new().unwrap();
        let store = FileRoleStore::open(dir.path().join("roles")).await.unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let first = FileRoleStore::open(dir.path()).await.unwrap();
        first.put("acct1_alice", &role("acct1_alice")).await.unwrap();

        let second = FileRoleStore::open(dir.path()).await.unwrap();
        assert!(second.get("acct1_alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let store = MemoryRoleStore::new();
        assert!(matches!(
            store.put("../escape", &role("acct1_alice")).await,
            Err(Error::Validation { .. })
        ));
        assert!(store.get("a/b").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[test]
    fn test_check_role_name() {
        assert!(check_role_name("acct1_alice").is_ok());
        assert!(check_role_name("br-4711@acct1.v2").is_ok());
        assert!(check_role_name("acct1_john doe").is_err());
        assert!(check_role_name(".hidden").is_err());
        assert!(check_role_name("acct1_a/b").is_err());
    }
}
