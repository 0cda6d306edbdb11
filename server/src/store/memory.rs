//! In-memory resource store.
//!
//! All tables sit behind one `RwLock`, so every write (including cascades)
//! is applied atomically with respect to readers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Community, ModerationLogEntry, Post, PostQuery, Rule};
use super::{CommunityStore, ModerationLogStore, PostStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    communities: HashMap<Uuid, Community>,
    /// Community name -> ID. Names are unique.
    names: HashMap<String, Uuid>,
    rules: HashMap<Uuid, Rule>,
    posts: HashMap<Uuid, Post>,
    moderation_log: Vec<ModerationLogEntry>,
}

/// Process-local store used by the server binary and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn fetch_community(&self, id: Uuid) -> StoreResult<Option<Community>> {
        Ok(self.tables.read().await.communities.get(&id).cloned())
    }

    async fn list_communities(&self) -> StoreResult<Vec<Community>> {
        let tables = self.tables.read().await;
        let mut communities: Vec<Community> = tables.communities.values().cloned().collect();
        communities.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(communities)
    }

    async fn insert_community(&self, mut community: Community) -> StoreResult<Community> {
        let mut tables = self.tables.write().await;
        if tables.names.contains_key(&community.name) {
            return Err(StoreError::DuplicateName);
        }
        community.version = 1;
        tables.names.insert(community.name.clone(), community.id);
        tables.communities.insert(community.id, community.clone());
        Ok(community)
    }

    async fn persist_community(&self, mut community: Community) -> StoreResult<Community> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.communities.get(&community.id) else {
            return Err(StoreError::Missing);
        };
        if current.version != community.version {
            return Err(StoreError::VersionConflict);
        }

        let old_name = current.name.clone();
        if old_name != community.name {
            if tables.names.contains_key(&community.name) {
                return Err(StoreError::DuplicateName);
            }
            tables.names.remove(&old_name);
            tables.names.insert(community.name.clone(), community.id);
        }

        community.version += 1;
        tables.communities.insert(community.id, community.clone());
        Ok(community)
    }

    async fn delete_community(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(community) = tables.communities.remove(&id) else {
            return Ok(false);
        };
        tables.names.remove(&community.name);
        tables.rules.retain(|_, rule| rule.community_id != id);
        tables.posts.retain(|_, post| post.community_id != id);
        Ok(true)
    }

    async fn list_rules(&self, community_id: Uuid) -> StoreResult<Vec<Rule>> {
        let tables = self.tables.read().await;
        let mut rules: Vec<Rule> = tables
            .rules
            .values()
            .filter(|r| r.community_id == community_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rules)
    }

    async fn fetch_rule(&self, id: Uuid) -> StoreResult<Option<Rule>> {
        Ok(self.tables.read().await.rules.get(&id).cloned())
    }

    async fn insert_rule(&self, rule: Rule) -> StoreResult<Rule> {
        let mut tables = self.tables.write().await;
        if !tables.communities.contains_key(&rule.community_id) {
            return Err(StoreError::Missing);
        }
        tables.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn persist_rule(&self, rule: Rule) -> StoreResult<Rule> {
        let mut tables = self.tables.write().await;
        if !tables.rules.contains_key(&rule.id) {
            return Err(StoreError::Missing);
        }
        tables.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn delete_rule(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.rules.remove(&id).is_some())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn fetch_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn list_posts(&self, query: &PostQuery) -> StoreResult<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn insert_post(&self, mut post: Post) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;
        // Posts cannot outlive (or precede) their community.
        if !tables.communities.contains_key(&post.community_id) {
            return Err(StoreError::Missing);
        }
        post.version = 1;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn persist_post(&self, mut post: Post) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.posts.get(&post.id) else {
            return Err(StoreError::Missing);
        };
        if current.version != post.version {
            return Err(StoreError::VersionConflict);
        }
        post.version += 1;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }
}

#[async_trait]
impl ModerationLogStore for MemoryStore {
    async fn append_moderation_entry(&self, entry: ModerationLogEntry) -> StoreResult<()> {
        self.tables.write().await.moderation_log.push(entry);
        Ok(())
    }

    async fn list_moderation_entries(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<ModerationLogEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .moderation_log
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
