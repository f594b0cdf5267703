//! Role and namespace deletion

use crate::control_plane::ControlPlane;
use keyward_core::types::ROLE_NAME_SEPARATOR;
use keyward_core::{Error, Result, Role, RoleStore};
use tracing::info;

/// Delete a role's keys and IAM user remotely, then its local record
///
/// Remote deletions treat "already gone" as success, so a failed attempt can
/// simply be retried: the record stays in place until the remote side is
/// clean.
pub async fn delete_role(
    control_plane: &dyn ControlPlane,
    store: &dyn RoleStore,
    name: &str,
) -> Result<Role> {
    let role = store
        .get(name)
        .await?
        .ok_or_else(|| Error::not_found(format!("role {}", name)))?;

    for key in &role.access_keys {
        control_plane
            .delete_access_key(&role.namespace, &role.username, &key.access_key_id)
            .await?;
    }
    control_plane
        .delete_iam_user(&role.namespace, &role.username)
        .await?;

    store.delete(name).await?;
    info!(namespace = %role.namespace, "Deleted role {}", name);
    Ok(role)
}

/// Drop every local role of a namespace, then deactivate it remotely
///
/// Returns the names of the removed roles.
pub async fn delete_namespace(
    control_plane: &dyn ControlPlane,
    store: &dyn RoleStore,
    namespace: &str,
) -> Result<Vec<String>> {
    let prefix = format!("{}{}", namespace, ROLE_NAME_SEPARATOR);
    let names = store.list_with_prefix(&prefix).await?;
    for name in &names {
        store.delete(name).await?;
    }

    control_plane.deactivate_namespace(namespace).await?;
    info!(
        namespace = %namespace,
        "Deactivated namespace and removed {} roles", names.len()
    );
    Ok(names)
}
