//! Error types for keyward

use thiserror::Error;

/// Result type alias using keyward-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the client, the lifecycle engine and the stores
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid input, caught before any remote call
    #[error("Invalid request: {message}")]
    Validation { message: String },

    /// Namespace, user or role absent
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Already exists, or already at key capacity
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Non-2xx response from the control plane
    #[error("Control plane returned {status}: {body}")]
    RemoteApi { status: u16, body: String },

    /// Login failed or the session could not be renewed
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Malformed timestamps or other unparsable remote data
    #[error("Invalid data: {message}")]
    Data { message: String },

    /// Connection level failure talking to the control plane
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Configuration missing or unusable
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Role store failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a remote API error from a status code and raw body
    pub fn remote_api(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteApi {
            status,
            body: body.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a data error
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Status code carried by a remote API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for local not-found errors and remote 404 responses
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. }) || self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_404_is_not_found() {
        let err = Error::remote_api(404, "{\"code\":1004}");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_remote_500_is_not_not_found() {
        let err = Error::remote_api(500, "boom");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Control plane returned 500: boom");
    }

    #[test]
    fn test_local_not_found() {
        let err = Error::not_found("namespace acct1");
        assert!(err.is_not_found());
        assert_eq!(err.status(), None);
    }
}
