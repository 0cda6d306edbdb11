//! Community and rule HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::service::{CommunityChanges, RuleChanges};
use super::types::{
    CommunityDetail, CommunityResponse, CreateCommunityRequest, CreateRuleRequest,
    UpdateCommunityRequest, UpdateRuleRequest,
};
use crate::api::AppState;
use crate::auth::CurrentActor;
use crate::error::ForumError;
use crate::store::Rule;

/// POST /api/communities
#[utoipa::path(
    post,
    path = "/api/communities",
    tag = "communities",
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, body = CommunityResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "No actor"),
        (status = 409, description = "Name taken")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn create_community(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(body): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<CommunityResponse>), ForumError> {
    body.validate()?;

    let community = state
        .communities
        .create(actor.as_ref(), body.name, body.description)
        .await?;

    Ok((StatusCode::CREATED, Json(CommunityResponse::from(&community))))
}

/// GET /api/communities
#[utoipa::path(
    get,
    path = "/api/communities",
    tag = "communities",
    responses((status = 200, body = Vec<CommunityResponse>))
)]
#[tracing::instrument(skip(state))]
pub async fn list_communities(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommunityResponse>>, ForumError> {
    let communities = state.communities.list().await?;
    Ok(Json(communities.iter().map(CommunityResponse::from).collect()))
}

/// GET /api/communities/{id}
#[utoipa::path(
    get,
    path = "/api/communities/{id}",
    tag = "communities",
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 200, body = CommunityDetail),
        (status = 404, description = "Community not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommunityDetail>, ForumError> {
    let community = state.communities.get(id).await?;
    let rules = state.communities.list_rules(id).await?;

    Ok(Json(CommunityDetail {
        community: CommunityResponse::from(&community),
        rules,
    }))
}

/// PATCH /api/communities/{id}
#[utoipa::path(
    patch,
    path = "/api/communities/{id}",
    tag = "communities",
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = UpdateCommunityRequest,
    responses(
        (status = 200, body = CommunityResponse),
        (status = 403, description = "Not the owner")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn update_community(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCommunityRequest>,
) -> Result<Json<CommunityResponse>, ForumError> {
    body.validate()?;

    let community = state
        .communities
        .update(
            actor.as_ref(),
            id,
            CommunityChanges {
                name: body.name,
                description: body.description,
            },
        )
        .await?;

    Ok(Json(CommunityResponse::from(&community)))
}

/// DELETE /api/communities/{id}
#[utoipa::path(
    delete,
    path = "/api/communities/{id}",
    tag = "communities",
    params(("id" = Uuid, Path, description = "Community ID")),
    responses(
        (status = 204, description = "Community and its rules and posts deleted"),
        (status = 403, description = "Not the owner")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_community(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ForumError> {
    state.communities.delete(actor.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/communities/{id}/rules
#[utoipa::path(
    get,
    path = "/api/communities/{id}/rules",
    tag = "rules",
    params(("id" = Uuid, Path, description = "Community ID")),
    responses((status = 200, body = Vec<Rule>))
)]
#[tracing::instrument(skip(state))]
pub async fn list_rules(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Rule>>, ForumError> {
    Ok(Json(state.communities.list_rules(id).await?))
}

/// POST /api/communities/{id}/rules
#[utoipa::path(
    post,
    path = "/api/communities/{id}/rules",
    tag = "rules",
    params(("id" = Uuid, Path, description = "Community ID")),
    request_body = CreateRuleRequest,
    responses(
        (status = 201, body = Rule),
        (status = 403, description = "Not a moderator")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn create_rule(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<Rule>), ForumError> {
    body.validate()?;

    let rule = state
        .communities
        .create_rule(actor.as_ref(), id, body.title, body.description)
        .await?;

    Ok((StatusCode::CREATED, Json(rule)))
}

/// PATCH /api/communities/{id}/rules/{rule_id}
#[utoipa::path(
    patch,
    path = "/api/communities/{id}/rules/{rule_id}",
    tag = "rules",
    params(
        ("id" = Uuid, Path, description = "Community ID"),
        ("rule_id" = Uuid, Path, description = "Rule ID")
    ),
    request_body = UpdateRuleRequest,
    responses(
        (status = 200, body = Rule),
        (status = 404, description = "Rule not found in this community")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn update_rule(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((id, rule_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateRuleRequest>,
) -> Result<Json<Rule>, ForumError> {
    body.validate()?;

    let rule = state
        .communities
        .update_rule(
            actor.as_ref(),
            id,
            rule_id,
            RuleChanges {
                title: body.title,
                description: body.description,
            },
        )
        .await?;

    Ok(Json(rule))
}

/// DELETE /api/communities/{id}/rules/{rule_id}
#[utoipa::path(
    delete,
    path = "/api/communities/{id}/rules/{rule_id}",
    tag = "rules",
    params(
        ("id" = Uuid, Path, description = "Community ID"),
        ("rule_id" = Uuid, Path, description = "Rule ID")
    ),
    responses((status = 204, description = "Rule deleted"))
)]
#[tracing::instrument(skip(state))]
pub async fn delete_rule(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((id, rule_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ForumError> {
    state
        .communities
        .delete_rule(actor.as_ref(), id, rule_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
