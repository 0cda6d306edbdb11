//! System Admin Module
//!
//! Admin-only endpoints:
//! - Moderation log across all communities
//! - Trending cache purge
//!
//! Gating happens in the services through system permissions, so anonymous
//! callers get 401 and non-admins 403.

pub mod handlers;

use axum::routing::{delete, get};
use axum::Router;

use crate::api::AppState;

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/moderation-log", get(handlers::get_moderation_log))
        .route("/trending", delete(handlers::purge_trending))
}
