//! Community Management Module
//!
//! Communities, their rules and their moderator routes.

pub mod handlers;
pub mod service;
pub mod types;

use axum::routing::{delete, get, patch};
use axum::Router;

use crate::api::AppState;
use crate::membership;

pub use service::{validate_name, CommunityChanges, CommunityService, RuleChanges};

/// Create the community router with all endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_communities).post(handlers::create_community),
        )
        .route(
            "/{id}",
            get(handlers::get_community)
                .patch(handlers::update_community)
                .delete(handlers::delete_community),
        )
        // Rule routes
        .route(
            "/{id}/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/{id}/rules/{rule_id}",
            patch(handlers::update_rule).delete(handlers::delete_rule),
        )
        // Moderator routes
        .route(
            "/{id}/moderators",
            get(membership::handlers::list_moderators).post(membership::handlers::add_moderator),
        )
        .route(
            "/{id}/moderators/{user_id}",
            delete(membership::handlers::remove_moderator),
        )
}
