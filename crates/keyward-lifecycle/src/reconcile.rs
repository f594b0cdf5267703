//! Namespace reconciliation
//!
//! Brings remote identities under management as roles:
//! - [`onboard`] creates a brand new IAM user with one key
//! - [`adopt`] registers a user whether or not it already exists
//! - [`migrate`] takes over a whole namespace, IAM and legacy users alike
//!
//! None of these roll back on partial failure. Steps that completed before an
//! error stay completed on the remote side.

use crate::control_plane::ControlPlane;
use keyward_core::types::{role_name, MAX_KEYS_PER_IDENTITY};
use keyward_core::{check_role_name, Error, Result, Role};
use std::collections::HashSet;
use tracing::{debug, info};

async fn ensure_namespace(control_plane: &dyn ControlPlane, namespace: &str) -> Result<()> {
    if control_plane.namespace_exists(namespace).await? {
        Ok(())
    } else {
        Err(Error::not_found(format!("namespace {}", namespace)))
    }
}

async fn user_exists(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    username: &str,
) -> Result<bool> {
    let users = control_plane.list_iam_users(namespace).await?;
    Ok(users.iter().any(|u| u == username))
}

/// CreateUser, AttachUserPolicy, CreateAccessKey
async fn create_identity(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    username: &str,
    name: Option<&str>,
) -> Result<Role> {
    control_plane.create_iam_user(namespace, username).await?;
    control_plane.attach_user_policy(namespace, username).await?;
    let key = control_plane.create_access_key(namespace, username).await?;

    let name = name
        .map(str::to_lowercase)
        .unwrap_or_else(|| role_name(namespace, username));
    info!(namespace = %namespace, "Onboarded IAM user {} as role {}", username, name);
    Ok(Role::new(name, namespace, username, key))
}

/// Onboard a new IAM user into an existing namespace
///
/// Fails with [`Error::NotFound`] when the namespace is absent and with
/// [`Error::Conflict`] when the user already exists, in both cases before
/// anything is created.
pub async fn onboard(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    username: &str,
    name: Option<&str>,
) -> Result<Role> {
    ensure_namespace(control_plane, namespace).await?;
    onboard_unchecked(control_plane, namespace, username, name).await
}

/// [`onboard`] without the namespace existence check
pub async fn onboard_unchecked(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    username: &str,
    name: Option<&str>,
) -> Result<Role> {
    if user_exists(control_plane, namespace, username).await? {
        return Err(Error::conflict(format!(
            "IAM user {} already exists in namespace {}",
            username, namespace
        )));
    }
    create_identity(control_plane, namespace, username, name).await
}

/// Register an IAM user, creating it if needed
///
/// An existing user keeps its listed keys (without secrets) and gains one new
/// key; a user already at two keys is a conflict.
pub async fn adopt(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    username: &str,
    name: Option<&str>,
) -> Result<Role> {
    ensure_namespace(control_plane, namespace).await?;

    if !user_exists(control_plane, namespace, username).await? {
        return create_identity(control_plane, namespace, username, name).await;
    }

    let existing = control_plane.list_access_keys(namespace, username).await?;
    if existing.len() >= MAX_KEYS_PER_IDENTITY {
        return Err(Error::conflict(format!(
            "IAM user {} already has {} access keys",
            username, MAX_KEYS_PER_IDENTITY
        )));
    }

    let key = control_plane.create_access_key(namespace, username).await?;
    let name = name
        .map(str::to_lowercase)
        .unwrap_or_else(|| role_name(namespace, username));
    info!(namespace = %namespace, "Adopted IAM user {} as role {}", username, name);

    let mut role = Role::new(name, namespace, username, key);
    role.access_keys.splice(0..0, existing);
    Ok(role)
}

/// Take over every identity of a namespace
///
/// Runs in two passes. The validation pass lists the keys of every IAM user,
/// resolves every legacy object user and derives each role name. It fails
/// with [`Error::Conflict`] when an IAM user is already at capacity or two
/// users map to the same role name, and with [`Error::Validation`] when a
/// name cannot be stored, before a single key is created. The mutation pass
/// then gives each IAM user one new key and onboards every legacy user that
/// has no IAM counterpart. The caller persists the returned roles.
pub async fn migrate(control_plane: &dyn ControlPlane, namespace: &str) -> Result<Vec<Role>> {
    ensure_namespace(control_plane, namespace).await?;

    let mut names = HashSet::new();
    let mut grow = Vec::new();
    for username in control_plane.list_iam_users(namespace).await? {
        let name = role_name(namespace, &username);
        check_role_name(&name)?;
        if !names.insert(name.clone()) {
            return Err(Error::conflict(format!(
                "IAM users in namespace {} collide on role name {}",
                namespace, name
            )));
        }

        let keys = control_plane.list_access_keys(namespace, &username).await?;
        if keys.len() >= MAX_KEYS_PER_IDENTITY {
            return Err(Error::conflict(format!(
                "IAM user {} in namespace {} already has {} access keys",
                username, namespace, MAX_KEYS_PER_IDENTITY
            )));
        }
        grow.push((name, username, keys));
    }

    let mut fresh = Vec::new();
    for native in control_plane.list_native_users(namespace).await? {
        let info = control_plane
            .native_user_info(namespace, &native.userid)
            .await?;
        let name = role_name(namespace, &info.name);
        if names.contains(&name) {
            debug!(namespace = %namespace, "Legacy user {} already managed", info.name);
            continue;
        }
        check_role_name(&name)?;
        names.insert(name.clone());
        fresh.push((name, info.name));
    }
    debug!(
        namespace = %namespace,
        "{} IAM users and {} legacy users passed validation",
        grow.len(),
        fresh.len()
    );

    let mut roles = Vec::with_capacity(grow.len() + fresh.len());
    for (name, username, existing) in grow {
        let key = control_plane.create_access_key(namespace, &username).await?;
        let mut role = Role::new(name, namespace, &username, key);
        role.access_keys.splice(0..0, existing);
        roles.push(role);
    }
    for (name, username) in fresh {
        roles.push(create_identity(control_plane, namespace, &username, Some(&name)).await?);
    }

    info!(namespace = %namespace, "Migrated {} roles", roles.len());
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::MockControlPlane;
    use crate::testing::{key, listed};
    use keyward_client::{NativeUser, NativeUserInfo};
    use keyward_core::KeyState;
    use mockall::Sequence;

    fn namespace_present(mock: &mut MockControlPlane) {
        mock.expect_namespace_exists()
            .withf(|ns| ns == "acct1")
            .returning(|_| Ok(true));
    }

    fn native_info(name: &str) -> NativeUserInfo {
        NativeUserInfo {
            name: name.to_string(),
            namespace: "acct1".to_string(),
            locked: false,
        }
    }

    fn native(userid: &str) -> NativeUser {
        NativeUser {
            userid: userid.to_string(),
            namespace: "acct1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_onboard_creates_user_policy_key_in_order() {
        let mut mock = MockControlPlane::new();
        let mut seq = Sequence::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users().returning(|_| Ok(vec![]));
        mock.expect_create_iam_user()
            .withf(|ns, user| ns == "acct1" && user == "alice")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_attach_user_policy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_create_access_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(key("k1", "2023-01-01T00:00:00Z")));

        let role = onboard(&mock, "acct1", "alice", None).await.unwrap();

        assert_eq!(role.name, "acct1_alice");
        assert_eq!(role.namespace, "acct1");
        assert_eq!(role.username, "alice");
        assert_eq!(role.key_ids(), vec!["k1"]);
        assert_eq!(role.state().unwrap(), KeyState::OneKey);
    }

    #[tokio::test]
    async fn test_onboard_uses_explicit_role_name() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users().returning(|_| Ok(vec![]));
        mock.expect_create_iam_user().returning(|_, _| Ok(()));
        mock.expect_attach_user_policy().returning(|_, _| Ok(()));
        mock.expect_create_access_key()
            .returning(|_, _| Ok(key("k1", "2023-01-01T00:00:00Z")));

        let role = onboard(&mock, "acct1", "alice", Some("BR-4711"))
            .await
            .unwrap();
        assert_eq!(role.name, "br-4711");
    }

    #[tokio::test]
    async fn test_onboard_missing_namespace() {
        let mut mock = MockControlPlane::new();
        mock.expect_namespace_exists().returning(|_| Ok(false));
        mock.expect_list_iam_users().never();
        mock.expect_create_iam_user().never();

        let err = onboard(&mock, "ghost", "alice", None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_onboard_existing_user_conflicts_without_side_effects() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["bob".to_string(), "alice".to_string()]));
        mock.expect_create_iam_user().never();
        mock.expect_attach_user_policy().never();
        mock.expect_create_access_key().never();

        let err = onboard(&mock, "acct1", "alice", None).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_onboard_uniqueness_is_exact_match() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["alice2".to_string(), "al".to_string()]));
        mock.expect_create_iam_user().times(1).returning(|_, _| Ok(()));
        mock.expect_attach_user_policy().returning(|_, _| Ok(()));
        mock.expect_create_access_key()
            .returning(|_, _| Ok(key("k1", "2023-01-01T00:00:00Z")));

        onboard(&mock, "acct1", "alice", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_onboard_does_not_roll_back_partial_failure() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users().returning(|_| Ok(vec![]));
        mock.expect_create_iam_user().times(1).returning(|_, _| Ok(()));
        mock.expect_attach_user_policy()
            .times(1)
            .returning(|_, _| Err(Error::remote_api(400, "bad policy")));
        mock.expect_create_access_key().never();
        mock.expect_delete_iam_user().never();

        let err = onboard(&mock, "acct1", "alice", None).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_adopt_existing_user_keeps_listed_key() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["alice".to_string()]));
        mock.expect_list_access_keys()
            .returning(|_, _| Ok(vec![listed("k1", "2022-01-01T00:00:00Z")]));
        mock.expect_create_iam_user().never();
        mock.expect_create_access_key()
            .times(1)
            .returning(|_, _| Ok(key("k2", "2023-01-01T00:00:00Z")));

        let role = adopt(&mock, "acct1", "alice", Some("acct1_alice"))
            .await
            .unwrap();

        assert_eq!(role.key_ids(), vec!["k1", "k2"]);
        assert!(!role.access_keys[0].has_secret());
        assert_eq!(role.newest_key().unwrap().access_key_id, "k2");
    }

    #[tokio::test]
    async fn test_adopt_full_user_conflicts() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["alice".to_string()]));
        mock.expect_list_access_keys().returning(|_, _| {
            Ok(vec![
                listed("k1", "2022-01-01T00:00:00Z"),
                listed("k2", "2022-06-01T00:00:00Z"),
            ])
        });
        mock.expect_create_access_key().never();

        let err = adopt(&mock, "acct1", "alice", None).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_adopt_absent_user_onboards() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users().returning(|_| Ok(vec![]));
        mock.expect_list_access_keys().never();
        mock.expect_create_iam_user().times(1).returning(|_, _| Ok(()));
        mock.expect_attach_user_policy()
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_create_access_key()
            .times(1)
            .returning(|_, _| Ok(key("k1", "2023-01-01T00:00:00Z")));

        let role = adopt(&mock, "acct1", "alice", None).await.unwrap();
        assert_eq!(role.key_ids(), vec!["k1"]);
    }

    #[tokio::test]
    async fn test_migrate_capacity_conflict_makes_no_mutations() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["alice".to_string(), "bob".to_string()]));
        mock.expect_list_access_keys()
            .withf(|_, user| user == "alice")
            .returning(|_, _| Ok(vec![listed("a1", "2022-01-01T00:00:00Z")]));
        mock.expect_list_access_keys()
            .withf(|_, user| user == "bob")
            .returning(|_, _| {
                Ok(vec![
                    listed("b1", "2022-01-01T00:00:00Z"),
                    listed("b2", "2022-02-01T00:00:00Z"),
                ])
            });
        mock.expect_create_access_key().never();
        mock.expect_delete_access_key().never();
        mock.expect_create_iam_user().never();
        mock.expect_list_native_users().never();

        let err = migrate(&mock, "acct1").await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_migrate_grows_iam_users_and_onboards_natives() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .times(1)
            .returning(|_| Ok(vec!["alice".to_string()]));
        mock.expect_list_access_keys()
            .returning(|_, _| Ok(vec![listed("a1", "2022-01-01T00:00:00Z")]));
        mock.expect_create_access_key()
            .withf(|_, user| user == "alice")
            .times(1)
            .returning(|_, _| Ok(key("a2", "2023-01-01T00:00:00Z")));
        mock.expect_list_native_users()
            .returning(|_| Ok(vec![native("u-1"), native("u-2")]));
        mock.expect_native_user_info()
            .withf(|_, id| id == "u-1")
            .returning(|_, _| Ok(native_info("alice")));
        mock.expect_native_user_info()
            .withf(|_, id| id == "u-2")
            .returning(|_, _| Ok(native_info("carol")));
        mock.expect_create_iam_user()
            .withf(|_, user| user == "carol")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_attach_user_policy()
            .withf(|_, user| user == "carol")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_create_access_key()
            .withf(|_, user| user == "carol")
            .times(1)
            .returning(|_, _| Ok(key("c1", "2023-01-01T00:00:00Z")));

        let roles = migrate(&mock, "acct1").await.unwrap();

        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].name, "acct1_alice");
        assert_eq!(roles[0].key_ids(), vec!["a1", "a2"]);
        assert_eq!(roles[1].name, "acct1_carol");
        assert_eq!(roles[1].key_ids(), vec!["c1"]);
        for role in &roles {
            assert!(role.state().is_ok());
        }
    }

    #[tokio::test]
    async fn test_migrate_missing_namespace() {
        let mut mock = MockControlPlane::new();
        mock.expect_namespace_exists().returning(|_| Ok(false));
        mock.expect_list_iam_users().never();

        let err = migrate(&mock, "ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_migrate_rejects_unstorable_names_before_any_mutation() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users().returning(|_| Ok(vec![]));
        mock.expect_list_native_users()
            .returning(|_| Ok(vec![native("u-1"), native("u-2")]));
        mock.expect_native_user_info()
            .withf(|_, id| id == "u-1")
            .returning(|_, _| Ok(native_info("john doe")));
        mock.expect_native_user_info()
            .withf(|_, id| id == "u-2")
            .returning(|_, _| Ok(native_info("dave")));
        mock.expect_create_iam_user().never();
        mock.expect_attach_user_policy().never();
        mock.expect_create_access_key().never();

        let err = migrate(&mock, "acct1").await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_migrate_lowercases_legacy_role_names() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["alice".to_string()]));
        mock.expect_list_access_keys()
            .returning(|_, _| Ok(vec![listed("a1", "2022-01-01T00:00:00Z")]));
        mock.expect_create_access_key()
            .withf(|_, user| user == "alice")
            .times(1)
            .returning(|_, _| Ok(key("a2", "2023-01-01T00:00:00Z")));
        mock.expect_list_native_users()
            .returning(|_| Ok(vec![native("u-1"), native("u-2")]));
        mock.expect_native_user_info()
            .withf(|_, id| id == "u-1")
            .returning(|_, _| Ok(native_info("Alice")));
        mock.expect_native_user_info()
            .withf(|_, id| id == "u-2")
            .returning(|_, _| Ok(native_info("Carol")));
        mock.expect_create_iam_user()
            .withf(|_, user| user == "Carol")
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_attach_user_policy().returning(|_, _| Ok(()));
        mock.expect_create_access_key()
            .withf(|_, user| user == "Carol")
            .times(1)
            .returning(|_, _| Ok(key("c1", "2023-01-01T00:00:00Z")));

        let roles = migrate(&mock, "acct1").await.unwrap();

        let names: Vec<_> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["acct1_alice", "acct1_carol"]);
        assert_eq!(roles[1].username, "Carol");
    }

    #[tokio::test]
    async fn test_migrate_colliding_iam_users_conflict() {
        let mut mock = MockControlPlane::new();
        namespace_present(&mut mock);
        mock.expect_list_iam_users()
            .returning(|_| Ok(vec!["alice".to_string(), "Alice".to_string()]));
        mock.expect_list_access_keys()
            .returning(|_, _| Ok(vec![listed("a1", "2022-01-01T00:00:00Z")]));
        mock.expect_create_access_key().never();
        mock.expect_list_native_users().never();

        let err = migrate(&mock, "acct1").await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }), "got {:?}", err);
    }
}
