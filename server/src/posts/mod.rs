//! Posts
//!
//! Post creation, reads and edits, plus the trending feed.

pub mod handlers;
pub mod service;
pub mod types;

use axum::routing::get;
use axum::Router;

use crate::api::AppState;

pub use service::{NewPost, PostChanges, PostService};

/// Create the posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_posts).post(handlers::create_post))
        .route("/trending", get(handlers::trending_posts))
        .route(
            "/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
}
