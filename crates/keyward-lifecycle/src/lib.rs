//! # keyward-lifecycle
//!
//! Credential lifecycle engine for keyward:
//! - Access key rotation state machine (grow, replace-oldest)
//! - Namespace reconciliation (onboard, adopt, migrate)
//! - Role and namespace deletion
//! - Control-plane account password rotation
//! - Session management and the typed operation dispatch table

pub mod account;
pub mod backend;
pub mod control_plane;
pub mod deletion;
pub mod ops;
pub mod reconcile;
pub mod rotation;
pub mod session;

pub use backend::Backend;
pub use control_plane::ControlPlane;
pub use ops::{Operation, Request, Response};
pub use session::Session;
