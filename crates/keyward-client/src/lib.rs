//! Client for the object-storage control-plane management API
//!
//! [`EcsClient`] logs in with Basic auth, keeps the returned session token and
//! transparently logs in once more when a request comes back 401. The
//! endpoint wrappers in [`api`] cover namespaces, IAM users, access keys,
//! legacy object users and the account password.

pub mod api;
pub mod client;
pub mod model;

pub use client::{ApiResponse, EcsClient, AUTH_TOKEN_HEADER, NAMESPACE_HEADER};
pub use model::{IamUser, NamespaceEntry, NativeUser, NativeUserInfo};
