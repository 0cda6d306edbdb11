//! Trending Posts Cache
//!
//! One process-wide snapshot of the top posts in a lookback window.
//! Populated on miss, served verbatim until its TTL runs out. Posts removed
//! after a snapshot was taken stay in it until expiry; that staleness is
//! accepted.
//!
//! Concurrent misses are collapsed behind a refresh mutex. A generation
//! counter keeps a computation that raced an invalidation from being stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use forum_common::Actor;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::ForumError;
use crate::permissions::{check_system_permission, Decision, SystemPermission};
use crate::store::{Post, PostQuery, PostStore};

/// The single cache key. There is one trending list for the whole forum.
pub const TRENDING_CACHE_KEY: &str = "trending_posts";

/// Cache knobs. The window and the TTL are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingSettings {
    /// Only posts created within this lookback are ranked.
    pub window: Duration,
    /// How long a snapshot is served before recomputing.
    pub ttl: Duration,
    /// Maximum posts in a snapshot.
    pub limit: usize,
}

impl Default for TrendingSettings {
    fn default() -> Self {
        Self {
            window: Duration::days(10),
            ttl: Duration::seconds(82_800),
            limit: 20,
        }
    }
}

/// A ranked list and the instant it was computed.
#[derive(Debug, Clone)]
pub struct TrendingSnapshot {
    pub posts: Arc<[Post]>,
    pub computed_at: DateTime<Utc>,
}

pub struct TrendingCache {
    store: Arc<dyn PostStore>,
    clock: Arc<dyn Clock>,
    settings: TrendingSettings,
    slot: RwLock<Option<TrendingSnapshot>>,
    /// Held while recomputing; at most one computation in flight.
    refresh: Mutex<()>,
    /// Bumped on invalidation so in-flight computations are not stored.
    generation: AtomicU64,
}

impl TrendingCache {
    pub fn new(store: Arc<dyn PostStore>, clock: Arc<dyn Clock>, settings: TrendingSettings) -> Self {
        Self {
            store,
            clock,
            settings,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current trending posts, highest vote count first.
    #[tracing::instrument(skip(self), fields(key = TRENDING_CACHE_KEY))]
    pub async fn get(&self) -> Result<TrendingSnapshot, ForumError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have refilled the slot while we waited.
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("Trending snapshot filled by concurrent refresh");
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let snapshot = self.compute().await?;

        if self.generation.load(Ordering::Acquire) == generation {
            *self.slot.write().await = Some(snapshot.clone());
            info!(
                posts = snapshot.posts.len(),
                computed_at = %snapshot.computed_at,
                "Trending snapshot stored"
            );
        } else {
            debug!("Trending cache invalidated during computation, not storing");
        }

        Ok(snapshot)
    }

    /// Drop the snapshot so the next read recomputes.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::Release);
        self.slot.write().await.take();
    }

    /// Admin-triggered invalidation.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn purge(&self, actor: Option<&Actor>) -> Result<(), ForumError> {
        if let Decision::Deny(reason) =
            check_system_permission(actor, SystemPermission::PurgeTrendingCache)
        {
            return Err(ForumError::Denied(reason));
        }
        self.invalidate().await;
        info!("Trending cache purged");
        Ok(())
    }

    /// When the stored snapshot was computed, if there is one.
    pub async fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().await.as_ref().map(|s| s.computed_at)
    }

    async fn fresh_snapshot(&self) -> Option<TrendingSnapshot> {
        let now = self.clock.now();
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|s| now - s.computed_at < self.settings.ttl)
            .cloned()
    }

    async fn compute(&self) -> Result<TrendingSnapshot, ForumError> {
        let now = self.clock.now();
        let query = PostQuery {
            community_id: None,
            created_since: Some(now - self.settings.window),
        };

        let mut posts: Vec<Post> = self
            .store
            .list_posts(&query)
            .await?
            .into_iter()
            .filter(|post| !post.is_removed())
            .collect();
        rank(&mut posts);
        posts.truncate(self.settings.limit);

        Ok(TrendingSnapshot {
            posts: posts.into(),
            computed_at: now,
        })
    }
}

/// Votes descending, then newest first, then ID.
fn rank(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use forum_common::Role;
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::*;
    use crate::clock::ManualClock;
    use crate::permissions::DenyReason;
    use crate::store::{Community, CommunityStore, MemoryStore, PostState, StoreResult};

    /// Counts listings; optionally parks each listing until released.
    struct CountingStore {
        inner: MemoryStore,
        listings: AtomicUsize,
        gated: bool,
        entered: Notify,
        release: Notify,
    }

    impl CountingStore {
        fn new(gated: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                listings: AtomicUsize::new(0),
                gated,
                entered: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl PostStore for CountingStore {
        async fn fetch_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
            self.inner.fetch_post(id).await
        }
        async fn list_posts(&self, query: &PostQuery) -> StoreResult<Vec<Post>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            if self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.list_posts(query).await
        }
        async fn insert_post(&self, post: Post) -> StoreResult<Post> {
            self.inner.insert_post(post).await
        }
        async fn persist_post(&self, post: Post) -> StoreResult<Post> {
            self.inner.persist_post(post).await
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    struct Fixture {
        store: Arc<CountingStore>,
        clock: Arc<ManualClock>,
        cache: Arc<TrendingCache>,
        community_id: Uuid,
    }

    async fn fixture(gated: bool) -> Fixture {
        let store = Arc::new(CountingStore::new(gated));
        let clock = Arc::new(ManualClock::new(start()));
        let community = store
            .inner
            .insert_community(Community::new("golang".into(), None, Uuid::new_v4(), start()))
            .await
            .unwrap();
        let cache = Arc::new(TrendingCache::new(
            store.clone(),
            clock.clone(),
            TrendingSettings::default(),
        ));
        Fixture {
            store,
            clock,
            cache,
            community_id: community.id,
        }
    }

    async fn add_post(f: &Fixture, votes: i64, age: Duration) -> Post {
        let created_at = f.clock.now() - age;
        f.store
            .insert_post(Post {
                id: Uuid::now_v7(),
                community_id: f.community_id,
                owner_id: Uuid::new_v4(),
                title: format!("{votes} votes"),
                body: Some("body".into()),
                url: None,
                media: None,
                vote_count: votes,
                comment_count: 0,
                is_spoiler: false,
                is_nsfw: false,
                state: PostState::Active,
                created_at,
                updated_at: created_at,
                version: 0,
            })
            .await
            .unwrap()
    }

    fn ids(snapshot: &TrendingSnapshot) -> Vec<Uuid> {
        snapshot.posts.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_window_and_ranking() {
        let f = fixture(false).await;
        let p1 = add_post(&f, 50, Duration::days(1)).await;
        let p2 = add_post(&f, 30, Duration::days(2)).await;
        let _p3 = add_post(&f, 80, Duration::days(40)).await;

        let snapshot = f.cache.get().await.unwrap();
        assert_eq!(ids(&snapshot), vec![p1.id, p2.id]);
    }

    #[tokio::test]
    async fn test_removed_posts_excluded_on_compute() {
        let f = fixture(false).await;
        let mut post = add_post(&f, 10, Duration::hours(1)).await;
        post.state = PostState::Removed {
            reason: None,
            removed_by: post.owner_id,
            removed_at: f.clock.now(),
        };
        f.store.persist_post(post).await.unwrap();

        assert!(f.cache.get().await.unwrap().posts.is_empty());
    }

    #[tokio::test]
    async fn test_limit_and_tie_break() {
        let f = fixture(false).await;
        let older = add_post(&f, 5, Duration::hours(3)).await;
        let newer = add_post(&f, 5, Duration::hours(1)).await;
        for _ in 0..25 {
            add_post(&f, 1, Duration::hours(2)).await;
        }

        let snapshot = f.cache.get().await.unwrap();
        assert_eq!(snapshot.posts.len(), 20);
        assert_eq!(snapshot.posts[0].id, newer.id);
        assert_eq!(snapshot.posts[1].id, older.id);
    }

    #[tokio::test]
    async fn test_snapshot_served_verbatim_within_ttl() {
        let f = fixture(false).await;
        let p1 = add_post(&f, 50, Duration::days(1)).await;

        let first = f.cache.get().await.unwrap();
        assert_eq!(ids(&first), vec![p1.id]);

        // New and removed posts are not reflected until the TTL runs out.
        let p2 = add_post(&f, 99, Duration::hours(1)).await;
        let mut removed = f.store.fetch_post(p1.id).await.unwrap().unwrap();
        removed.state = PostState::Removed {
            reason: None,
            removed_by: removed.owner_id,
            removed_at: f.clock.now(),
        };
        f.store.persist_post(removed).await.unwrap();

        f.clock.advance(Duration::seconds(82_799));
        let cached = f.cache.get().await.unwrap();
        assert_eq!(ids(&cached), vec![p1.id]);
        assert_eq!(cached.computed_at, first.computed_at);
        assert_eq!(f.store.listings.load(Ordering::SeqCst), 1);

        f.clock.advance(Duration::seconds(1));
        let refreshed = f.cache.get().await.unwrap();
        assert_eq!(ids(&refreshed), vec![p2.id]);
        assert_eq!(f.store.listings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_compute_once() {
        let f = fixture(true).await;
        add_post(&f, 3, Duration::hours(1)).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&f.cache);
            handles.push(tokio::spawn(async move { cache.get().await.unwrap() }));
        }

        f.store.entered.notified().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        f.store.release.notify_one();

        let mut computed_at = Vec::new();
        for handle in handles {
            computed_at.push(handle.await.unwrap().computed_at);
        }
        assert_eq!(f.store.listings.load(Ordering::SeqCst), 1);
        assert!(computed_at.iter().all(|t| *t == computed_at[0]));
    }

    #[tokio::test]
    async fn test_invalidation_during_compute_is_not_stored() {
        let f = fixture(true).await;
        let post = add_post(&f, 3, Duration::hours(1)).await;

        let cache = Arc::clone(&f.cache);
        let pending = tokio::spawn(async move { cache.get().await.unwrap() });

        f.store.entered.notified().await;
        f.cache.invalidate().await;
        f.store.release.notify_one();

        let snapshot = pending.await.unwrap();
        assert_eq!(ids(&snapshot), vec![post.id]);
        assert_eq!(f.cache.cached_at().await, None);
    }

    #[tokio::test]
    async fn test_purge_requires_admin() {
        let f = fixture(false).await;
        f.cache.get().await.unwrap();
        assert!(f.cache.cached_at().await.is_some());

        let user = Actor::user(Uuid::new_v4());
        assert!(matches!(
            f.cache.purge(Some(&user)).await,
            Err(ForumError::Denied(DenyReason::NotAdmin))
        ));
        assert!(f.cache.cached_at().await.is_some());

        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        f.cache.purge(Some(&admin)).await.unwrap();
        assert!(f.cache.cached_at().await.is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = TrendingSettings::default();
        assert_eq!(settings.window, Duration::days(10));
        assert_eq!(settings.ttl, Duration::seconds(82_800));
        assert_eq!(settings.limit, 20);
    }
}
