//! Membership Registry
//!
//! Moderator sets of communities.

pub mod handlers;
pub mod registry;

pub use registry::ModeratorRegistry;
