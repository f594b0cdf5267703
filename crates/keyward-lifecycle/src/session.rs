//! Shared control-plane session
//!
//! The client is built on first use from the stored configuration and shared
//! by every later operation. Changing the configuration or the account
//! password must [`Session::invalidate`] it so the next operation logs in
//! with the new settings.

use keyward_client::EcsClient;
use keyward_core::{ConfigStore, Error, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub struct Session {
    config: Arc<dyn ConfigStore>,
    client: RwLock<Option<Arc<EcsClient>>>,
}

impl Session {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            config,
            client: RwLock::new(None),
        }
    }

    /// The shared client, logging in first if there is none yet
    pub async fn client(&self) -> Result<Arc<EcsClient>> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(Arc::clone(client));
        }

        let mut slot = self.client.write().await;
        // Another caller may have connected while we waited for the lock
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let config = self
            .config
            .load()
            .await?
            .ok_or_else(|| Error::config("control plane is not configured"))?;
        debug!("Connecting to {}", config.url);
        let client = Arc::new(EcsClient::connect(&config).await?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the shared client; the next call reconnects
    pub async fn invalidate(&self) {
        if self.client.write().await.take().is_some() {
            debug!("Session invalidated");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}
