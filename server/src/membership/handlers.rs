//! Moderator HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::CurrentActor;
use crate::community::types::{AddModeratorRequest, ModeratorsResponse};
use crate::error::ForumError;

/// GET /api/communities/{id}/moderators
#[utoipa::path(
    get,
    path = "/api/communities/{id}/moderators",
    tag = "moderators",
    params(("id" = Uuid, Path, description = "Community ID")),
    responses((status = 200, body = ModeratorsResponse))
)]
#[tracing::instrument(skip(state))]
pub async fn list_moderators(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModeratorsResponse>, ForumError> {
    let moderator_ids = state.moderators.list_moderators(id).await?;
    Ok(Json(ModeratorsResponse {
        community_id: id,
        moderator_ids,
    }))
}

/// POST /api/communities/{id}/moderators
#[utoipa::path(
    post,
    path = "/api/communities/{id}/moderators",
    tag = "moderators",
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = AddModeratorRequest,
    responses(
        (status = 201, body = ModeratorsResponse),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Already a moderator")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn add_moderator(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
    Json(body): Json<AddModeratorRequest>,
) -> Result<(StatusCode, Json<ModeratorsResponse>), ForumError> {
    let community = state
        .moderators
        .add_moderator(actor.as_ref(), id, body.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ModeratorsResponse {
            community_id: community.id,
            moderator_ids: community.moderators().iter().copied().collect(),
        }),
    ))
}

/// DELETE /api/communities/{id}/moderators/{user_id}
#[utoipa::path(
    delete,
    path = "/api/communities/{id}/moderators/{user_id}",
    tag = "moderators",
    params(
        ("id" = Uuid, Path, description = "Community ID"),
        ("user_id" = Uuid, Path, description = "Moderator to remove")
    ),
    responses(
        (status = 200, body = ModeratorsResponse),
        (status = 403, description = "Not the owner, or target is the owner")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn remove_moderator(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ModeratorsResponse>, ForumError> {
    let community = state
        .moderators
        .remove_moderator(actor.as_ref(), id, user_id)
        .await?;

    Ok(Json(ModeratorsResponse {
        community_id: community.id,
        moderator_ids: community.moderators().iter().copied().collect(),
    }))
}
