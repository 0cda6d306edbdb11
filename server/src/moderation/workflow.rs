//! Post moderation state machine.
//!
//! `Active -> Removed` is the only transition and it is terminal. Removal
//! redacts the body, keeps the reason and leaves counters untouched.

use std::sync::Arc;

use forum_common::Actor;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ForumError, ResourceKind};
use crate::locks::KeyedLocks;
use crate::permissions::{
    authorize, check_system_permission, Action, Decision, DenyReason, Resource, SystemPermission,
};
use crate::store::{
    Community, CommunityStore, ModerationLogEntry, ModerationLogStore, Post, PostState, PostStore,
    StoreError,
};

/// Replaces the body of a removed post.
pub const REDACTION_MARKER: &str = "[deleted]";

const MAX_ATTEMPTS: usize = 2;

/// A requested moderation transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    Remove { reason: Option<String> },
}

/// Result of a removal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The post moved to `Removed`; carries the stored copy.
    Removed(Post),
    /// The post was already removed. Nothing changed.
    AlreadyRemoved,
}

pub struct ModerationWorkflow {
    posts: Arc<dyn PostStore>,
    communities: Arc<dyn CommunityStore>,
    log: Arc<dyn ModerationLogStore>,
    clock: Arc<dyn Clock>,
    post_locks: Arc<KeyedLocks>,
}

impl ModerationWorkflow {
    pub fn new(
        posts: Arc<dyn PostStore>,
        communities: Arc<dyn CommunityStore>,
        log: Arc<dyn ModerationLogStore>,
        clock: Arc<dyn Clock>,
        post_locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            posts,
            communities,
            log,
            clock,
            post_locks,
        }
    }

    /// Apply a moderation action to a post.
    ///
    /// Repeating a removal as the author or a community moderator succeeds
    /// with [`RemovalOutcome::AlreadyRemoved`]. Anyone else sees a removed
    /// post as missing.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn transition(
        &self,
        actor: Option<&Actor>,
        post_id: Uuid,
        action: ModerationAction,
    ) -> Result<RemovalOutcome, ForumError> {
        let ModerationAction::Remove { reason } = action;
        let _guard = self.post_locks.lock(post_id).await;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (mut post, community) = self.load(post_id).await?;

            let decision = authorize(
                actor,
                Action::Delete,
                Resource::Post {
                    post: &post,
                    community: &community,
                },
            );

            if post.is_removed() {
                return match decision {
                    Decision::Allow => Ok(RemovalOutcome::AlreadyRemoved),
                    Decision::Deny(_) => Err(ForumError::NotFound(ResourceKind::Post)),
                };
            }
            decision.require(ResourceKind::Post)?;
            let Some(actor) = actor else {
                return Err(ForumError::Denied(DenyReason::Unauthenticated));
            };

            let now = self.clock.now();
            post.state = PostState::Removed {
                reason: reason.clone(),
                removed_by: actor.id,
                removed_at: now,
            };
            post.body = Some(REDACTION_MARKER.to_string());
            post.updated_at = now;

            let saved = match self.posts.persist_post(post).await {
                Ok(saved) => saved,
                Err(StoreError::VersionConflict) if attempt < MAX_ATTEMPTS => {
                    warn!(%post_id, attempt, "Post changed during removal, retrying");
                    continue;
                }
                Err(StoreError::Missing) => return Err(ForumError::NotFound(ResourceKind::Post)),
                Err(err) => return Err(err.into()),
            };

            // The removal is committed; a lost log entry must not undo it.
            if let Err(err) = self
                .log
                .append_moderation_entry(ModerationLogEntry {
                    id: Uuid::now_v7(),
                    post_id: saved.id,
                    community_id: saved.community_id,
                    actor_id: actor.id,
                    reason: reason.clone(),
                    created_at: now,
                })
                .await
            {
                error!(post_id = %saved.id, error = %err, "Failed to write moderation log entry");
            }

            info!(
                post_id = %saved.id,
                community_id = %saved.community_id,
                removed_by = %actor.id,
                by_author = saved.owner_id == actor.id,
                "Post removed"
            );
            return Ok(RemovalOutcome::Removed(saved));
        }
    }

    /// Most recent removals across all communities. Admin only.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn moderation_log(
        &self,
        actor: Option<&Actor>,
        limit: usize,
    ) -> Result<Vec<ModerationLogEntry>, ForumError> {
        if let Decision::Deny(reason) =
            check_system_permission(actor, SystemPermission::ViewModerationLog)
        {
            return Err(ForumError::Denied(reason));
        }
        Ok(self.log.list_moderation_entries(limit).await?)
    }

    async fn load(&self, post_id: Uuid) -> Result<(Post, Community), ForumError> {
        let post = self
            .posts
            .fetch_post(post_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Post))?;
        // A post outliving its community is treated as gone.
        let community = self
            .communities
            .fetch_community(post.community_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Post))?;
        Ok((post, community))
    }
}
