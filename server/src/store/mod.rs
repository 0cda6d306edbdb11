//! Resource Store
//!
//! Persistence seam for communities, rules, posts and the moderation log.
//! The core only fetches and persists through these traits; `MemoryStore`
//! is the in-process implementation.
//!
//! Persisting a versioned resource fails with [`StoreError::VersionConflict`]
//! when the stored copy changed since it was fetched.

mod memory;
mod models;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::*;

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The stored resource changed since it was fetched.
    #[error("Resource was modified concurrently")]
    VersionConflict,

    /// A community with the same name already exists.
    #[error("Community name already taken")]
    DuplicateName,

    /// Persisting a resource that no longer exists.
    #[error("Resource no longer exists")]
    Missing,

    /// Backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Communities and their rules.
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn fetch_community(&self, id: Uuid) -> StoreResult<Option<Community>>;

    async fn list_communities(&self) -> StoreResult<Vec<Community>>;

    async fn insert_community(&self, community: Community) -> StoreResult<Community>;

    /// Replace a community, checking its version. Returns the stored copy.
    async fn persist_community(&self, community: Community) -> StoreResult<Community>;

    /// Hard delete. Rules and posts of the community go with it.
    async fn delete_community(&self, id: Uuid) -> StoreResult<bool>;

    /// Rules of a community, newest first.
    async fn list_rules(&self, community_id: Uuid) -> StoreResult<Vec<Rule>>;

    async fn fetch_rule(&self, id: Uuid) -> StoreResult<Option<Rule>>;

    async fn insert_rule(&self, rule: Rule) -> StoreResult<Rule>;

    async fn persist_rule(&self, rule: Rule) -> StoreResult<Rule>;

    async fn delete_rule(&self, id: Uuid) -> StoreResult<bool>;
}

/// Posts, regardless of moderation state.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn fetch_post(&self, id: Uuid) -> StoreResult<Option<Post>>;

    /// Raw listing; visibility is decided by the caller.
    async fn list_posts(&self, query: &PostQuery) -> StoreResult<Vec<Post>>;

    async fn insert_post(&self, post: Post) -> StoreResult<Post>;

    /// Replace a post, checking its version. Returns the stored copy.
    async fn persist_post(&self, post: Post) -> StoreResult<Post>;
}

#[async_trait]
pub trait ModerationLogStore: Send + Sync {
    async fn append_moderation_entry(&self, entry: ModerationLogEntry) -> StoreResult<()>;

    /// Most recent entries first.
    async fn list_moderation_entries(&self, limit: usize)
        -> StoreResult<Vec<ModerationLogEntry>>;
}

/// Everything the forum core persists.
pub trait ResourceStore: CommunityStore + PostStore + ModerationLogStore {}

impl<T> ResourceStore for T where T: CommunityStore + PostStore + ModerationLogStore {}
