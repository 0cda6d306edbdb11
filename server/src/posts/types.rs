//! Post Type Definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::store::Post;
use crate::trending::TrendingSnapshot;

// ============================================================================
// Response Types
// ============================================================================

/// A visible post. Moderation state is never exposed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: Uuid,
    pub community_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub media: Option<String>,
    pub vote_count: i64,
    pub comment_count: i64,
    pub is_spoiler: bool,
    pub is_nsfw: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            community_id: post.community_id,
            owner_id: post.owner_id,
            title: post.title.clone(),
            body: post.body.clone(),
            url: post.url.clone(),
            media: post.media.clone(),
            vote_count: post.vote_count,
            comment_count: post.comment_count,
            is_spoiler: post.is_spoiler,
            is_nsfw: post.is_nsfw,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrendingResponse {
    pub posts: Vec<PostResponse>,
    /// When the served snapshot was computed.
    pub computed_at: DateTime<Utc>,
}

impl From<&TrendingSnapshot> for TrendingResponse {
    fn from(snapshot: &TrendingSnapshot) -> Self {
        Self {
            posts: snapshot.posts.iter().map(PostResponse::from).collect(),
            computed_at: snapshot.computed_at,
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    pub community_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(max = 40000, message = "Body must be at most 40000 characters"))]
    pub body: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    #[validate(length(max = 500, message = "Media reference must be at most 500 characters"))]
    pub media: Option<String>,
    #[serde(default)]
    pub is_spoiler: bool,
    #[serde(default)]
    pub is_nsfw: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 40000, message = "Body must be at most 40000 characters"))]
    pub body: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    #[validate(length(max = 500, message = "Media reference must be at most 500 characters"))]
    pub media: Option<String>,
    pub is_spoiler: Option<bool>,
    pub is_nsfw: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListPostsQuery {
    /// Restrict to one community.
    pub community_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
pub struct DeletePostQuery {
    /// Kept on the removed post and in the moderation log.
    #[validate(length(max = 255, message = "Reason must be at most 255 characters"))]
    pub reason: Option<String>,
}
