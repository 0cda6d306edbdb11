//! Forum resource models.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A named, owned, moderated discussion space.
///
/// The owner is a member of the moderator set for the whole lifetime of the
/// community; the set is only reachable through methods that keep it so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    moderator_ids: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token maintained by the store.
    pub version: u64,
}

impl Community {
    /// Create a community owned (and moderated) by `owner_id`.
    #[must_use]
    pub fn new(
        name: String,
        description: Option<String>,
        owner_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            description,
            owner_id,
            moderator_ids: BTreeSet::from([owner_id]),
            created_at,
            version: 0,
        }
    }

    #[must_use]
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    #[must_use]
    pub fn is_moderator(&self, user_id: Uuid) -> bool {
        self.moderator_ids.contains(&user_id)
    }

    /// Moderator IDs in ascending order (owner included).
    #[must_use]
    pub const fn moderators(&self) -> &BTreeSet<Uuid> {
        &self.moderator_ids
    }

    /// Add a moderator. Returns `false` if already present.
    pub(crate) fn insert_moderator(&mut self, user_id: Uuid) -> bool {
        self.moderator_ids.insert(user_id)
    }

    /// Remove a moderator. Returns `false` if not present.
    ///
    /// The owner is never removed; `OwnerProtected` is returned instead.
    pub(crate) fn remove_moderator(&mut self, user_id: Uuid) -> Result<bool, OwnerProtected> {
        if self.is_owner(user_id) {
            return Err(OwnerProtected);
        }
        Ok(self.moderator_ids.remove(&user_id))
    }
}

/// Attempted to drop the owner from a community's moderator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerProtected;

/// A community rule. Lives and dies with its community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Rule {
    pub id: Uuid,
    pub community_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Moderation state of a post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PostState {
    #[default]
    Active,
    /// Terminal. Body content has been redacted.
    Removed {
        reason: Option<String>,
        removed_by: Uuid,
        removed_at: DateTime<Utc>,
    },
}

impl PostState {
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }

    #[must_use]
    pub fn removal_reason(&self) -> Option<&str> {
        match self {
            Self::Active => None,
            Self::Removed { reason, .. } => reason.as_deref(),
        }
    }
}

/// A post in a community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    /// Fixed at creation.
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
    pub state: PostState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token maintained by the store.
    pub version: u64,
}

impl Post {
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.state.is_removed()
    }
}

/// Entry in the moderation log, written for every effective post removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ModerationLogEntry {
    pub id: Uuid,
    pub post_id: Uuid,
    pub community_id: Uuid,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter for post listings.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Restrict to a single community.
    pub community_id: Option<Uuid>,
    /// Only posts created at or after this instant.
    pub created_since: Option<DateTime<Utc>>,
}

impl PostQuery {
    pub(crate) fn matches(&self, post: &Post) -> bool {
        self.community_id.is_none_or(|id| post.community_id == id)
            && self.created_since.is_none_or(|since| post.created_at >= since)
    }
}
