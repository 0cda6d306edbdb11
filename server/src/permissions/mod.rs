//! Permission system types and utilities.
//!
//! Two-tier permission model:
//! - System permissions: platform-level admin actions, gated by role
//! - Community permissions: per-community ownership and moderator membership

pub mod models;
pub mod resolver;
pub mod system;

pub use models::{Action, Decision, DenyReason, Resource};
pub use resolver::authorize;
pub use system::{check_system_permission, SystemPermission};
