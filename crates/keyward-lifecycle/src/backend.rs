//! The operation backend
//!
//! [`Backend`] owns the role store, the config store and the control-plane
//! [`Session`], and executes [`Request`]s against them. It is constructed once
//! and passed by reference; there is no global state.

use crate::account;
use crate::deletion;
use crate::ops::{ConfigView, Credentials, Operation, Request, Response};
use crate::ops::{IamUserOnboardRequest, NamespaceOnboardRequest, RoleWriteRequest};
use crate::reconcile;
use crate::rotation;
use crate::session::Session;
use keyward_core::types::{namespace_of, role_name, ROLE_NAME_SEPARATOR};
use keyward_core::{ConfigStore, ControlPlaneConfig, Error, Result, Role, RoleStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Backend {
    roles: Arc<dyn RoleStore>,
    config: Arc<dyn ConfigStore>,
    session: Session,
}

impl Backend {
    pub fn new(roles: Arc<dyn RoleStore>, config: Arc<dyn ConfigStore>) -> Self {
        let session = Session::new(Arc::clone(&config));
        Self {
            roles,
            config,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute an operation by name with JSON arguments
    pub async fn dispatch(&self, operation: &str, data: serde_json::Value) -> Result<Response> {
        let operation: Operation = operation.parse()?;
        self.execute(Request::parse(operation, data)?).await
    }

    /// Validate and execute a request
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let request = request.validate()?;
        debug!("Executing {}", request.operation());

        match request {
            Request::ConfigRead => Ok(Response::Config(self.read_config().await?)),
            Request::ConfigWrite(req) => {
                self.write_config(req.into()).await?;
                Ok(Response::Empty)
            }
            Request::ConfigRotateRoot => Ok(Response::PasswordRotated {
                username: self.rotate_root().await?,
            }),
            Request::RoleRead(req) => Ok(Response::role(&self.read_role(&req.name).await?)),
            Request::RoleList => Ok(Response::Names(self.roles.list_with_prefix("").await?)),
            Request::RoleWrite(req) => Ok(Response::role(&self.write_role(req).await?)),
            Request::RoleDelete(req) => {
                let client = self.session.client().await?;
                deletion::delete_role(&*client, self.roles.as_ref(), &req.name).await?;
                Ok(Response::Deleted { name: req.name })
            }
            Request::RoleRotate(req) => Ok(Response::role(&self.rotate_role(&req.name).await?)),
            Request::CredsRead(req) => {
                let role = self.read_role(&req.name).await?;
                Ok(Response::Credentials(Credentials::from_role(&role)?))
            }
            Request::IamUserOnboard(req) => {
                Ok(Response::role(&self.onboard_iam_user(req).await?))
            }
            Request::NamespaceOnboard(req) => {
                Ok(Response::role(&self.onboard_namespace(req).await?))
            }
            Request::NamespaceMigrate(req) => {
                let roles = self.migrate_namespace(&req.namespace).await?;
                Ok(Response::Migrated {
                    namespace: req.namespace,
                    roles: roles.into_iter().map(|r| r.name).collect(),
                })
            }
            Request::NamespaceList => Ok(Response::Names(self.list_namespaces().await?)),
            Request::NamespaceDelete(req) => {
                let client = self.session.client().await?;
                let removed =
                    deletion::delete_namespace(&*client, self.roles.as_ref(), &req.namespace)
                        .await?;
                Ok(Response::Names(removed))
            }
        }
    }

    async fn load_config(&self) -> Result<ControlPlaneConfig> {
        self.config
            .load()
            .await?
            .ok_or_else(|| Error::config("control plane is not configured"))
    }

    async fn read_config(&self) -> Result<ConfigView> {
        Ok(ConfigView::from(&self.load_config().await?))
    }

    async fn write_config(&self, config: ControlPlaneConfig) -> Result<()> {
        self.config.save(&config).await?;
        self.session.invalidate().await;
        info!("Saved control-plane configuration for {}", config.url);
        Ok(())
    }

    /// Rotate the account password and store it; returns the account name
    async fn rotate_root(&self) -> Result<String> {
        let mut config = self.load_config().await?;
        let client = self.session.client().await?;

        config.password = account::rotate_account_password(&*client, &config.username).await?;
        let saved = self.config.save(&config).await;
        self.session.invalidate().await;

        if let Err(e) = saved {
            error!(
                "Password of {} was changed but could not be saved: {}",
                config.username, e
            );
            return Err(e);
        }
        Ok(config.username)
    }

    async fn read_role(&self, name: &str) -> Result<Role> {
        self.roles
            .get(name)
            .await?
            .ok_or_else(|| Error::not_found(format!("role {}", name)))
    }

    async fn ensure_role_absent(&self, name: &str) -> Result<()> {
        if self.roles.get(name).await?.is_some() {
            return Err(Error::conflict(format!("role {} already exists", name)));
        }
        Ok(())
    }

    async fn store_role(&self, role: &Role) -> Result<()> {
        self.roles.put(&role.name, role).await
    }

    async fn write_role(&self, req: RoleWriteRequest) -> Result<Role> {
        self.ensure_role_absent(&req.name).await?;

        let client = self.session.client().await?;
        let mut role =
            reconcile::adopt(&*client, &req.namespace, req.username(), Some(&req.name)).await?;
        role.ttl = req.ttl.unwrap_or(0);
        role.max_ttl = req.max_ttl.unwrap_or(0);

        self.store_role(&role).await?;
        Ok(role)
    }

    async fn rotate_role(&self, name: &str) -> Result<Role> {
        let mut role = self.read_role(name).await?;
        let client = self.session.client().await?;

        let state = rotation::advance(&*client, &mut role).await?;
        if let Err(e) = self.store_role(&role).await {
            warn!(role = %name, "Rotated keys could not be saved: {}", e);
            return Err(e);
        }
        debug!(role = %name, "Role is now in state {}", state);
        Ok(role)
    }

    async fn onboard_iam_user(&self, req: IamUserOnboardRequest) -> Result<Role> {
        let name = role_name(&req.namespace, &req.username);
        self.ensure_role_absent(&name).await?;
        let correlated = self
            .roles
            .list_with_prefix(&format!("{}{}", name, ROLE_NAME_SEPARATOR))
            .await?;
        if let Some(existing) = correlated.first() {
            return Err(Error::conflict(format!(
                "IAM user {} is already managed by role {}",
                req.username, existing
            )));
        }

        let client = self.session.client().await?;
        let role = reconcile::onboard(&*client, &req.namespace, &req.username, None).await?;
        self.store_role(&role).await?;
        Ok(role)
    }

    async fn onboard_namespace(&self, req: NamespaceOnboardRequest) -> Result<Role> {
        let name = req
            .name
            .clone()
            .unwrap_or_else(|| role_name(&req.namespace, &req.username));
        self.ensure_role_absent(&name).await?;

        let client = self.session.client().await?;
        let role =
            reconcile::onboard(&*client, &req.namespace, &req.username, Some(&name)).await?;
        self.store_role(&role).await?;
        Ok(role)
    }

    async fn migrate_namespace(&self, namespace: &str) -> Result<Vec<Role>> {
        let client = self.session.client().await?;
        let roles = reconcile::migrate(&*client, namespace).await?;
        for role in &roles {
            self.store_role(role).await?;
        }
        Ok(roles)
    }

    /// Distinct namespaces among stored role names
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let names = self.roles.list_with_prefix("").await?;
        let namespaces: BTreeSet<&str> = names.iter().map(|n| namespace_of(n)).collect();
        Ok(namespaces.into_iter().map(str::to_string).collect())
    }
}
