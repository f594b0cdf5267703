//! # keyward-core
//!
//! Core library for keyward providing:
//! - The error taxonomy shared by the client and lifecycle crates
//! - Role and access key types, including key ordering by creation date
//! - Control-plane configuration loading (YAML file + environment overrides)
//! - The role store abstraction with in-memory and file-backed implementations
//! - Password generation for the control-plane account

pub mod config;
pub mod error;
pub mod password;
pub mod security;
pub mod store;
pub mod types;

pub use config::{ConfigStore, ControlPlaneConfig, FileConfigStore, MemoryConfigStore};
pub use error::{Error, Result};
pub use security::SecureString;
pub use store::{check_role_name, FileRoleStore, MemoryRoleStore, RoleStore};
pub use types::{AccessKey, KeyState, Role};
