//! Control-plane account password rotation

use crate::control_plane::ControlPlane;
use keyward_core::password::generate_password;
use keyward_core::{Result, SecureString};
use tracing::info;

/// Generate a new password for the management account and set it remotely
///
/// The caller must persist the returned password and drop its session: the
/// current token stays valid only until it expires.
pub async fn rotate_account_password(
    control_plane: &dyn ControlPlane,
    username: &str,
) -> Result<SecureString> {
    let password = generate_password();
    control_plane
        .update_account_password(username, &password)
        .await?;
    info!("Rotated password of management account {}", username);
    Ok(password)
}
