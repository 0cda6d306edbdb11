//! Admin HTTP handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::AppState;
use crate::auth::CurrentActor;
use crate::error::ForumError;
use crate::store::ModerationLogEntry;

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 200;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ModerationLogQuery {
    /// Entries to return (default 50, capped at 200).
    pub limit: Option<usize>,
}

/// GET /api/admin/moderation-log
#[utoipa::path(
    get,
    path = "/api/admin/moderation-log",
    tag = "admin",
    params(ModerationLogQuery),
    responses(
        (status = 200, body = Vec<ModerationLogEntry>),
        (status = 401, description = "No actor"),
        (status = 403, description = "Not an admin")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_moderation_log(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<ModerationLogQuery>,
) -> Result<Json<Vec<ModerationLogEntry>>, ForumError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);

    let entries = state.moderation.moderation_log(actor.as_ref(), limit).await?;
    Ok(Json(entries))
}

/// DELETE /api/admin/trending
#[utoipa::path(
    delete,
    path = "/api/admin/trending",
    tag = "admin",
    responses(
        (status = 204, description = "Trending snapshot dropped"),
        (status = 403, description = "Not an admin")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn purge_trending(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<StatusCode, ForumError> {
    state.trending.purge(actor.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
