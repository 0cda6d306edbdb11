//! Forum Server
//!
//! Authorization and moderation core for a community forum: a per-resource
//! policy evaluator, community moderator sets, soft-delete moderation of
//! posts and a process-wide trending cache, served over a JSON API.

pub mod admin;
pub mod api;
pub mod auth;
pub mod clock;
pub mod community;
pub mod config;
pub mod error;
pub mod locks;
pub mod membership;
pub mod moderation;
pub mod permissions;
pub mod posts;
pub mod store;
pub mod trending;

pub use error::ForumError;
