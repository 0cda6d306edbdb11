//! Moderator registry.
//!
//! Owner-only add/remove of community moderators. The owner can never be
//! removed; that check runs before and independently of authorization.

use std::sync::Arc;

use forum_common::Actor;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ConflictKind, ForumError, ResourceKind};
use crate::locks::KeyedLocks;
use crate::permissions::{authorize, Action, DenyReason, Resource};
use crate::store::{Community, CommunityStore, StoreError};

/// Persist attempts per mutation: the first try plus one retry on a version conflict.
const MAX_ATTEMPTS: usize = 2;

pub struct ModeratorRegistry {
    store: Arc<dyn CommunityStore>,
    locks: Arc<KeyedLocks>,
}

impl ModeratorRegistry {
    /// `locks` is shared with every other writer of communities.
    pub fn new(store: Arc<dyn CommunityStore>, locks: Arc<KeyedLocks>) -> Self {
        Self { store, locks }
    }

    /// Moderators of a community, owner included.
    #[tracing::instrument(skip(self))]
    pub async fn list_moderators(&self, community_id: Uuid) -> Result<Vec<Uuid>, ForumError> {
        let community = self.fetch(community_id).await?;
        authorize(
            None,
            Action::Read,
            Resource::Membership {
                community: &community,
                target: None,
            },
        )
        .require(ResourceKind::Community)?;
        Ok(community.moderators().iter().copied().collect())
    }

    /// Add `target` to the moderator set.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn add_moderator(
        &self,
        actor: Option<&Actor>,
        community_id: Uuid,
        target: Uuid,
    ) -> Result<Community, ForumError> {
        let community = self
            .mutate(community_id, |community| {
                authorize(
                    actor,
                    Action::Add,
                    Resource::Membership {
                        community,
                        target: Some(target),
                    },
                )
                .require(ResourceKind::Community)?;

                if !community.insert_moderator(target) {
                    return Err(ForumError::Conflict(ConflictKind::AlreadyMember));
                }
                Ok(())
            })
            .await?;

        info!(community_id = %community.id, moderator_id = %target, "Moderator added");
        Ok(community)
    }

    /// Remove `target` from the moderator set.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn remove_moderator(
        &self,
        actor: Option<&Actor>,
        community_id: Uuid,
        target: Uuid,
    ) -> Result<Community, ForumError> {
        let community = self
            .mutate(community_id, |community| {
                // Whoever asks, the owner stays.
                if community.is_owner(target) {
                    return Err(ForumError::Denied(DenyReason::OwnerProtected));
                }

                authorize(
                    actor,
                    Action::Remove,
                    Resource::Membership {
                        community,
                        target: Some(target),
                    },
                )
                .require(ResourceKind::Community)?;

                match community.remove_moderator(target) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(ForumError::NotFound(ResourceKind::Moderator)),
                    Err(_) => Err(ForumError::Denied(DenyReason::OwnerProtected)),
                }
            })
            .await?;

        info!(community_id = %community.id, moderator_id = %target, "Moderator removed");
        Ok(community)
    }

    async fn fetch(&self, community_id: Uuid) -> Result<Community, ForumError> {
        self.store
            .fetch_community(community_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Community))
    }

    /// Apply `change` to a fresh copy and persist it.
    ///
    /// Checks inside `change` are re-run against the re-fetched community
    /// when the first persist loses a version race.
    async fn mutate<F>(&self, community_id: Uuid, change: F) -> Result<Community, ForumError>
    where
        F: Fn(&mut Community) -> Result<(), ForumError>,
    {
        let _guard = self.locks.lock(community_id).await;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut community = self.fetch(community_id).await?;
            change(&mut community)?;

            match self.store.persist_community(community).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::VersionConflict) if attempt < MAX_ATTEMPTS => {
                    warn!(%community_id, attempt, "Moderator set changed concurrently, retrying");
                }
                Err(StoreError::Missing) => {
                    return Err(ForumError::NotFound(ResourceKind::Community));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::store::{MemoryStore, Rule, StoreResult};

    async fn setup() -> (Arc<MemoryStore>, ModeratorRegistry, Actor, Community) {
        let store = Arc::new(MemoryStore::new());
        let owner = Actor::user(Uuid::new_v4());
        let community = store
            .insert_community(Community::new("golang".into(), None, owner.id, Utc::now()))
            .await
            .unwrap();
        let registry = ModeratorRegistry::new(store.clone(), Arc::new(KeyedLocks::new()));
        (store, registry, owner, community)
    }

    #[tokio::test]
    async fn test_owner_adds_moderator() {
        let (_store, registry, owner, community) = setup().await;
        let b = Uuid::new_v4();

        let updated = registry
            .add_moderator(Some(&owner), community.id, b)
            .await
            .unwrap();

        assert_eq!(updated.moderators().len(), 2);
        assert!(updated.is_moderator(b));
        assert!(updated.is_moderator(owner.id));
    }

    #[tokio::test]
    async fn test_add_existing_moderator_conflicts() {
        let (_store, registry, owner, community) = setup().await;

        let result = registry
            .add_moderator(Some(&owner), community.id, owner.id)
            .await;
        assert!(matches!(
            result,
            Err(ForumError::Conflict(ConflictKind::AlreadyMember))
        ));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_add() {
        let (_store, registry, owner, community) = setup().await;
        let moderator = Actor::user(Uuid::new_v4());
        registry
            .add_moderator(Some(&owner), community.id, moderator.id)
            .await
            .unwrap();

        let result = registry
            .add_moderator(Some(&moderator), community.id, Uuid::new_v4())
            .await;
        assert!(matches!(
            result,
            Err(ForumError::Denied(DenyReason::NotOwner))
        ));
    }

    #[tokio::test]
    async fn test_authorization_checked_before_duplicate() {
        let (_store, registry, owner, community) = setup().await;
        let stranger = Actor::user(Uuid::new_v4());

        // Target is already a moderator, but the stranger must learn nothing.
        let result = registry
            .add_moderator(Some(&stranger), community.id, owner.id)
            .await;
        assert!(matches!(
            result,
            Err(ForumError::Denied(DenyReason::NotOwner))
        ));
    }

    #[tokio::test]
    async fn test_owner_is_protected_from_anyone() {
        let (_store, registry, owner, community) = setup().await;
        let moderator = Actor::user(Uuid::new_v4());
        registry
            .add_moderator(Some(&owner), community.id, moderator.id)
            .await
            .unwrap();

        for actor in [Some(&owner), Some(&moderator), None] {
            let result = registry
                .remove_moderator(actor, community.id, owner.id)
                .await;
            assert!(matches!(
                result,
                Err(ForumError::Denied(DenyReason::OwnerProtected))
            ));
        }
    }

    #[tokio::test]
    async fn test_remove_moderator() {
        let (store, registry, owner, community) = setup().await;
        let b = Uuid::new_v4();
        registry
            .add_moderator(Some(&owner), community.id, b)
            .await
            .unwrap();

        let updated = registry
            .remove_moderator(Some(&owner), community.id, b)
            .await
            .unwrap();
        assert!(!updated.is_moderator(b));

        let stored = store.fetch_community(community.id).await.unwrap().unwrap();
        assert_eq!(stored.moderators().len(), 1);
        assert!(stored.is_moderator(owner.id));
    }

    #[tokio::test]
    async fn test_remove_unknown_moderator_not_found() {
        let (_store, registry, owner, community) = setup().await;
        let result = registry
            .remove_moderator(Some(&owner), community.id, Uuid::new_v4())
            .await;
        assert!(matches!(
            result,
            Err(ForumError::NotFound(ResourceKind::Moderator))
        ));
    }

    #[tokio::test]
    async fn test_missing_community() {
        let (_store, registry, owner, _community) = setup().await;
        let result = registry
            .add_moderator(Some(&owner), Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(
            result,
            Err(ForumError::NotFound(ResourceKind::Community))
        ));
    }

    #[tokio::test]
    async fn test_missing_communities_leave_no_lock_entries() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(KeyedLocks::new());
        let registry = ModeratorRegistry::new(store, Arc::clone(&locks));

        for _ in 0..100 {
            let result = registry
                .remove_moderator(None, Uuid::new_v4(), Uuid::new_v4())
                .await;
            assert!(matches!(
                result,
                Err(ForumError::NotFound(ResourceKind::Community))
            ));
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_owner_always_in_set_after_concurrent_mutations() {
        let (store, registry, owner, community) = setup().await;
        let registry = Arc::new(registry);
        let targets: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();

        let mut handles = Vec::new();
        for target in targets.clone() {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .add_moderator(Some(&owner), community.id, target)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut handles = Vec::new();
        for target in targets.iter().copied().step_by(2) {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .remove_moderator(Some(&owner), community.id, target)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = store.fetch_community(community.id).await.unwrap().unwrap();
        assert!(stored.is_moderator(owner.id));
        assert_eq!(stored.moderators().len(), 1 + targets.len() / 2);
    }

    /// Store whose first `persist_community` calls fail with a version conflict.
    struct FlakyStore {
        inner: MemoryStore,
        conflicts_left: AtomicUsize,
        persists: AtomicUsize,
    }

    #[async_trait]
    impl CommunityStore for FlakyStore {
        async fn fetch_community(&self, id: Uuid) -> StoreResult<Option<Community>> {
            self.inner.fetch_community(id).await
        }
        async fn list_communities(&self) -> StoreResult<Vec<Community>> {
            self.inner.list_communities().await
        }
        async fn insert_community(&self, community: Community) -> StoreResult<Community> {
            self.inner.insert_community(community).await
        }
        async fn persist_community(&self, community: Community) -> StoreResult<Community> {
            self.persists.fetch_add(1, Ordering::SeqCst);
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::VersionConflict);
            }
            self.inner.persist_community(community).await
        }
        async fn delete_community(&self, id: Uuid) -> StoreResult<bool> {
            self.inner.delete_community(id).await
        }
        async fn list_rules(&self, community_id: Uuid) -> StoreResult<Vec<Rule>> {
            self.inner.list_rules(community_id).await
        }
        async fn fetch_rule(&self, id: Uuid) -> StoreResult<Option<Rule>> {
            self.inner.fetch_rule(id).await
        }
        async fn insert_rule(&self, rule: Rule) -> StoreResult<Rule> {
            self.inner.insert_rule(rule).await
        }
        async fn persist_rule(&self, rule: Rule) -> StoreResult<Rule> {
            self.inner.persist_rule(rule).await
        }
        async fn delete_rule(&self, id: Uuid) -> StoreResult<bool> {
            self.inner.delete_rule(id).await
        }
    }

    async fn flaky(conflicts: usize) -> (Arc<FlakyStore>, ModeratorRegistry, Actor, Uuid) {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            conflicts_left: AtomicUsize::new(conflicts),
            persists: AtomicUsize::new(0),
        });
        let owner = Actor::user(Uuid::new_v4());
        let community = store
            .insert_community(Community::new("flaky".into(), None, owner.id, Utc::now()))
            .await
            .unwrap();
        let registry = ModeratorRegistry::new(store.clone(), Arc::new(KeyedLocks::new()));
        (store, registry, owner, community.id)
    }

    #[tokio::test]
    async fn test_conflict_retried_once() {
        let (store, registry, owner, community_id) = flaky(1).await;

        let updated = registry
            .add_moderator(Some(&owner), community_id, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(updated.moderators().len(), 2);
        assert_eq!(store.persists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_conflict_surfaces() {
        let (store, registry, owner, community_id) = flaky(2).await;
        let target = Uuid::new_v4();

        let result = registry
            .add_moderator(Some(&owner), community_id, target)
            .await;

        assert!(matches!(
            result,
            Err(ForumError::Conflict(ConflictKind::ConcurrentModification))
        ));
        assert_eq!(store.persists.load(Ordering::SeqCst), 2);
        // Nothing partial was stored.
        let stored = store.fetch_community(community_id).await.unwrap().unwrap();
        assert!(!stored.is_moderator(target));
    }
}
