//! Post operations.
//!
//! Removed posts are filtered on every read by asking the policy evaluator,
//! never by a listing flag. Removal itself lives in the moderation workflow.

use std::collections::HashMap;
use std::sync::Arc;

use forum_common::Actor;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ForumError, InvalidInput, ResourceKind};
use crate::locks::KeyedLocks;
use crate::permissions::{authorize, Action, DenyReason, Resource};
use crate::store::{Community, CommunityStore, Post, PostQuery, PostState, PostStore, StoreError};

/// Fields of a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub community_id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub media: Option<String>,
    pub is_spoiler: bool,
    pub is_nsfw: bool,
}

impl NewPost {
    /// At least one of body, URL or media with something in it.
    fn has_content(&self) -> bool {
        [&self.body, &self.url, &self.media]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Requested post changes. `None` leaves a field untouched.
///
/// Content presence is only enforced at creation.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub media: Option<String>,
    pub is_spoiler: Option<bool>,
    pub is_nsfw: Option<bool>,
}

pub struct PostService {
    posts: Arc<dyn PostStore>,
    communities: Arc<dyn CommunityStore>,
    clock: Arc<dyn Clock>,
    post_locks: Arc<KeyedLocks>,
}

impl PostService {
    /// `post_locks` is shared with the moderation workflow.
    pub fn new(
        posts: Arc<dyn PostStore>,
        communities: Arc<dyn CommunityStore>,
        clock: Arc<dyn Clock>,
        post_locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            posts,
            communities,
            clock,
            post_locks,
        }
    }

    /// Create a post in a community the actor moderates.
    ///
    /// Anonymous callers are rejected outright. Otherwise checked in order:
    /// community exists, content present, membership.
    #[tracing::instrument(skip(self, actor, new), fields(actor_id = ?actor.map(|a| a.id), community_id = %new.community_id))]
    pub async fn create(&self, actor: Option<&Actor>, new: NewPost) -> Result<Post, ForumError> {
        let Some(author) = actor else {
            return Err(ForumError::Denied(DenyReason::Unauthenticated));
        };

        let community = self
            .communities
            .fetch_community(new.community_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Community))?;

        if !new.has_content() {
            return Err(ForumError::InvalidInput(InvalidInput::MissingContent));
        }

        authorize(actor, Action::Create, Resource::Posts(&community))
            .require(ResourceKind::Community)?;

        let now = self.clock.now();
        let post = Post {
            id: Uuid::now_v7(),
            community_id: community.id,
            owner_id: author.id,
            title: new.title,
            body: new.body,
            url: new.url,
            media: new.media,
            vote_count: 0,
            comment_count: 0,
            is_spoiler: new.is_spoiler,
            is_nsfw: new.is_nsfw,
            state: PostState::Active,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let post = match self.posts.insert_post(post).await {
            Ok(post) => post,
            Err(StoreError::Missing) => return Err(ForumError::NotFound(ResourceKind::Community)),
            Err(err) => return Err(err.into()),
        };

        info!(post_id = %post.id, "Post created");
        Ok(post)
    }

    /// A visible post. Removed posts are not found, for every actor.
    pub async fn get(&self, actor: Option<&Actor>, post_id: Uuid) -> Result<Post, ForumError> {
        let (post, community) = self.load(post_id).await?;
        authorize(
            actor,
            Action::Read,
            Resource::Post {
                post: &post,
                community: &community,
            },
        )
        .require(ResourceKind::Post)?;
        Ok(post)
    }

    /// Visible posts, newest first, optionally in one community.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn list(
        &self,
        actor: Option<&Actor>,
        community_id: Option<Uuid>,
    ) -> Result<Vec<Post>, ForumError> {
        let mut communities: HashMap<Uuid, Community> = HashMap::new();
        if let Some(id) = community_id {
            let community = self
                .communities
                .fetch_community(id)
                .await?
                .ok_or(ForumError::NotFound(ResourceKind::Community))?;
            communities.insert(id, community);
        }

        let posts = self
            .posts
            .list_posts(&PostQuery {
                community_id,
                created_since: None,
            })
            .await?;

        let mut visible = Vec::with_capacity(posts.len());
        for post in posts {
            if !communities.contains_key(&post.community_id) {
                // Deleted between the two reads.
                let Some(community) = self.communities.fetch_community(post.community_id).await?
                else {
                    continue;
                };
                communities.insert(post.community_id, community);
            }
            let Some(community) = communities.get(&post.community_id) else {
                continue;
            };

            let decision = authorize(
                actor,
                Action::Read,
                Resource::Post {
                    post: &post,
                    community,
                },
            );
            if decision.is_allowed() {
                visible.push(post);
            }
        }
        Ok(visible)
    }

    /// Edit a post. Its author only; the community never changes.
    #[tracing::instrument(skip(self, actor, changes), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Result<Post, ForumError> {
        let _guard = self.post_locks.lock(post_id).await;
        let (mut post, community) = self.load(post_id).await?;

        let resource = Resource::Post {
            post: &post,
            community: &community,
        };
        authorize(actor, Action::Read, resource).require(ResourceKind::Post)?;
        authorize(actor, Action::Update, resource).require(ResourceKind::Post)?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(body) = changes.body {
            post.body = Some(body);
        }
        if let Some(url) = changes.url {
            post.url = Some(url);
        }
        if let Some(media) = changes.media {
            post.media = Some(media);
        }
        if let Some(is_spoiler) = changes.is_spoiler {
            post.is_spoiler = is_spoiler;
        }
        if let Some(is_nsfw) = changes.is_nsfw {
            post.is_nsfw = is_nsfw;
        }
        post.updated_at = self.clock.now();

        let post = match self.posts.persist_post(post).await {
            Ok(saved) => saved,
            Err(StoreError::Missing) => return Err(ForumError::NotFound(ResourceKind::Post)),
            Err(err) => return Err(err.into()),
        };
        info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    async fn load(&self, post_id: Uuid) -> Result<(Post, Community), ForumError> {
        let post = self
            .posts
            .fetch_post(post_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Post))?;
        let community = self
            .communities
            .fetch_community(post.community_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Post))?;
        Ok((post, community))
    }
}
