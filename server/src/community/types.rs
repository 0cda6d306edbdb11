//! Community Type Definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::store::{Community, Rule};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommunityResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    /// Owner included.
    pub moderator_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Community> for CommunityResponse {
    fn from(community: &Community) -> Self {
        Self {
            id: community.id,
            name: community.name.clone(),
            description: community.description.clone(),
            owner_id: community.owner_id,
            moderator_ids: community.moderators().iter().copied().collect(),
            created_at: community.created_at,
        }
    }
}

/// Community with its rules.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommunityDetail {
    #[serde(flatten)]
    pub community: CommunityResponse,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModeratorsResponse {
    pub community_id: Uuid,
    pub moderator_ids: Vec<Uuid>,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommunityRequest {
    /// Letters, digits and underscores, at most 21 characters.
    pub name: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommunityRequest {
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRuleRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRuleRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddModeratorRequest {
    pub user_id: Uuid,
}
