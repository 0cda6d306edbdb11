//! Post HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::service::{NewPost, PostChanges};
use super::types::{
    CreatePostRequest, DeletePostQuery, ListPostsQuery, PostResponse, TrendingResponse,
    UpdatePostRequest,
};
use crate::api::AppState;
use crate::auth::CurrentActor;
use crate::error::ForumError;
use crate::moderation::{ModerationAction, RemovalOutcome};

/// POST /api/posts
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, body = PostResponse),
        (status = 400, description = "No body, URL or media"),
        (status = 403, description = "Not a member of the community"),
        (status = 404, description = "Community not found")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn create_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ForumError> {
    body.validate()?;

    let post = state
        .posts
        .create(
            actor.as_ref(),
            NewPost {
                community_id: body.community_id,
                title: body.title,
                body: body.body,
                url: body.url,
                media: body.media,
                is_spoiler: body.is_spoiler,
                is_nsfw: body.is_nsfw,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(&post))))
}

/// GET /api/posts
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(ListPostsQuery),
    responses((status = 200, body = Vec<PostResponse>))
)]
#[tracing::instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>, ForumError> {
    let posts = state.posts.list(actor.as_ref(), query.community_id).await?;
    Ok(Json(posts.iter().map(PostResponse::from).collect()))
}

/// GET /api/posts/trending
#[utoipa::path(
    get,
    path = "/api/posts/trending",
    tag = "posts",
    responses((status = 200, body = TrendingResponse))
)]
#[tracing::instrument(skip(state))]
pub async fn trending_posts(
    State(state): State<AppState>,
) -> Result<Json<TrendingResponse>, ForumError> {
    let snapshot = state.trending.get().await?;
    Ok(Json(TrendingResponse::from(&snapshot)))
}

/// GET /api/posts/{id}
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, body = PostResponse),
        (status = 404, description = "Post not found or removed")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, ForumError> {
    let post = state.posts.get(actor.as_ref(), id).await?;
    Ok(Json(PostResponse::from(&post)))
}

/// PATCH /api/posts/{id}
#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, body = PostResponse),
        (status = 403, description = "Not the author")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn update_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ForumError> {
    body.validate()?;

    let post = state
        .posts
        .update(
            actor.as_ref(),
            id,
            PostChanges {
                title: body.title,
                body: body.body,
                url: body.url,
                media: body.media,
                is_spoiler: body.is_spoiler,
                is_nsfw: body.is_nsfw,
            },
        )
        .await?;

    Ok(Json(PostResponse::from(&post)))
}

/// DELETE /api/posts/{id}
///
/// Soft delete. Repeating it as the author or a moderator is a no-op.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID"), DeletePostQuery),
    responses(
        (status = 204, description = "Post removed, or already removed"),
        (status = 403, description = "Neither the author nor a moderator"),
        (status = 404, description = "Post not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
    Query(query): Query<DeletePostQuery>,
) -> Result<StatusCode, ForumError> {
    query.validate()?;

    let outcome = state
        .moderation
        .transition(
            actor.as_ref(),
            id,
            ModerationAction::Remove {
                reason: query.reason,
            },
        )
        .await?;

    if outcome == RemovalOutcome::AlreadyRemoved {
        tracing::debug!(post_id = %id, "Post already removed");
    }
    Ok(StatusCode::NO_CONTENT)
}
