//! Session-token HTTP client
//!
//! The control plane hands out a session token from `GET /login` (Basic auth)
//! in the `X-SDS-AUTH-TOKEN` response header. Every later request carries that
//! header. Tokens expire server-side; when a request comes back 401 the client
//! logs in exactly once more and retries the request once.

use keyward_core::{ControlPlaneConfig, Error, Result, SecureString};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Session token header, sent on every authenticated request
pub const AUTH_TOKEN_HEADER: &str = "X-SDS-AUTH-TOKEN";

/// Namespace scoping header for IAM calls
pub const NAMESPACE_HEADER: &str = "x-emc-namespace";

/// Raw successful response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::data(format!(
                "unexpected response body ({}): {}",
                e,
                truncate(&self.body)
            ))
        })
    }
}

/// Authenticated control-plane client
pub struct EcsClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: SecureString,
    token: RwLock<Option<String>>,
}

impl EcsClient {
    /// Build a client without logging in
    pub fn new(config: &ControlPlaneConfig) -> Result<Self> {
        config.validate()?;

        if config.skip_ssl {
            warn!("TLS verification disabled for {}", config.url);
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.skip_ssl)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: RwLock::new(None),
        })
    }

    /// Build a client and log in
    pub async fn connect(config: &ControlPlaneConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.login().await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether a session token is currently held
    pub async fn has_session(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Obtain a fresh session token, replacing the current one
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/login", self.base_url);
        debug!("Logging in to {} as {}", self.base_url, self.username);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(self.password.expose()))
            .send()
            .await
            .map_err(|e| Error::transport(format!("login request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(Error::auth(format!(
                "login returned {}",
                response.status().as_u16()
            )));
        }

        let token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::auth(format!(
                    "login response carried no {} header",
                    AUTH_TOKEN_HEADER
                ))
            })?
            .to_string();

        *self.token.write().await = Some(token);
        debug!("Session established for {}", self.username);
        Ok(())
    }

    /// Perform an authenticated request
    ///
    /// A 401 triggers one re-login and one retry. A second 401, or a failed
    /// re-login, is an [`Error::Auth`]. Any final status >= 300 is an
    /// [`Error::RemoteApi`] carrying the status and raw body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        namespace: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse> {
        let url = self.url_for(path);
        let payload = body.map(serde_json::to_vec).transpose()?;

        let mut response = self
            .send(&method, &url, namespace, payload.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("{} {} returned 401, renewing session", method, path);
            self.login().await.map_err(|e| match e {
                Error::Auth { .. } => e,
                other => Error::auth(format!("session renewal failed: {}", other)),
            })?;

            response = self
                .send(&method, &url, namespace, payload.as_deref())
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(Error::auth(format!(
                    "{} {} still unauthorized after renewing the session",
                    method, path
                )));
            }
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {}", e)))?;

        if status >= 300 {
            debug!("{} {} failed with {}", method, path, status);
            return Err(Error::remote_api(status, body));
        }

        Ok(ApiResponse { status, body })
    }

    /// Perform an authenticated request and decode the JSON response
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        namespace: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        self.call(method, path, namespace, body).await?.json()
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        namespace: Option<&str>,
        payload: Option<&[u8]>,
    ) -> Result<reqwest::Response> {
        let token = self.token.read().await.clone().unwrap_or_default();

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTH_TOKEN_HEADER, token)
            .header("Content-Type", "application/json; charset=UTF-8")
            .header("Accept", "application/json");

        if let Some(ns) = namespace {
            request = request.header(NAMESPACE_HEADER, ns);
        }
        if let Some(bytes) = payload {
            request = request.body(bytes.to_vec());
        }

        request
            .send()
            .await
            .map_err(|e| Error::transport(format!("{} {} failed: {}", method, url, e)))
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

impl std::fmt::Debug for EcsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcsClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
