//! CLI command implementations

pub mod call;
pub mod config;
pub mod creds;
pub mod iam_user;
pub mod namespace;
pub mod role;

use anyhow::{Context as _, Result};
use keyward_core::config::default_state_dir;
use keyward_core::{FileConfigStore, FileRoleStore};
use keyward_lifecycle::{Backend, Request, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::output;

/// Role store directory inside the state directory
const ROLES_DIR: &str = "roles";

/// Everything a command needs: the backend and output preferences
pub struct Context {
    pub backend: Backend,
    pub state_dir: PathBuf,
    pub json: bool,
}

impl Context {
    pub async fn open(state_dir: Option<&Path>, json: bool) -> Result<Self> {
        let state_dir = match state_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_state_dir().context("Failed to resolve the state directory")?,
        };
        debug!("Using state directory {}", state_dir.display());

        let roles = FileRoleStore::open(state_dir.join(ROLES_DIR))
            .await
            .with_context(|| format!("Failed to open role store in {}", state_dir.display()))?;
        let config = FileConfigStore::in_dir(&state_dir);

        Ok(Self {
            backend: Backend::new(Arc::new(roles), Arc::new(config)),
            state_dir,
            json,
        })
    }

    /// Execute a request, naming the operation in errors
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let operation = request.operation();
        self.backend
            .execute(request)
            .await
            .with_context(|| format!("{} failed", operation))
    }

    /// Print a response the way the user asked for
    pub fn print(&self, response: &Response) -> Result<()> {
        if self.json {
            output::json(response)
        } else {
            output::response(response);
            Ok(())
        }
    }
}
