//! Access key rotation state machine
//!
//! An identity holds one or two keys. [`advance`] grows a single-key role to
//! two keys, and on a two-key role replaces the older key with a new one.
//! Which key is older is decided by creation date, never by position.
//!
//! The role is only modified once every remote call has succeeded. If the
//! old key was deleted but its replacement could not be created, the role is
//! returned untouched with the error and the remote identity is left with a
//! single key.

use crate::control_plane::ControlPlane;
use keyward_core::types::MAX_KEYS_PER_IDENTITY;
use keyward_core::{Error, KeyState, Result, Role};
use tracing::{info, warn};

/// Add a second key to a single-key role
pub async fn grow(control_plane: &dyn ControlPlane, role: &mut Role) -> Result<()> {
    if role.state()? != KeyState::OneKey {
        return Err(Error::conflict(format!(
            "role {} already holds {} access keys",
            role.name, MAX_KEYS_PER_IDENTITY
        )));
    }

    let key = control_plane
        .create_access_key(&role.namespace, &role.username)
        .await?;
    info!(role = %role.name, "Added access key {}", key.access_key_id);
    role.access_keys.push(key);
    Ok(())
}

/// Replace the older of two keys with a new one
pub async fn rotate(control_plane: &dyn ControlPlane, role: &mut Role) -> Result<()> {
    if role.state()? != KeyState::TwoKeys {
        return Err(Error::validation(format!(
            "role {} holds a single access key, nothing to rotate",
            role.name
        )));
    }

    // Resolve the order before touching the remote side
    let (oldest, _) = role.key_order()?;
    let evicted = role.access_keys[oldest].access_key_id.clone();

    control_plane
        .delete_access_key(&role.namespace, &role.username, &evicted)
        .await?;

    let key = match control_plane
        .create_access_key(&role.namespace, &role.username)
        .await
    {
        Ok(key) => key,
        Err(e) => {
            warn!(
                role = %role.name,
                "Access key {} was deleted but its replacement could not be created: {}",
                evicted,
                e
            );
            return Err(e);
        }
    };

    info!(
        role = %role.name,
        "Rotated access key {} -> {}", evicted, key.access_key_id
    );
    role.access_keys[oldest] = key;
    Ok(())
}

/// Move a role one step forward: grow a single key, rotate two
pub async fn advance(control_plane: &dyn ControlPlane, role: &mut Role) -> Result<KeyState> {
    match role.state()? {
        KeyState::OneKey => grow(control_plane, role).await?,
        KeyState::TwoKeys => rotate(control_plane, role).await?,
    }
    role.state()
}
