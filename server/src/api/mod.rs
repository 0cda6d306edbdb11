//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{extract::State, middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    admin, auth,
    auth::IdentityProvider,
    clock::Clock,
    community,
    community::CommunityService,
    config::Config,
    locks::KeyedLocks,
    membership::{self, ModeratorRegistry},
    moderation::ModerationWorkflow,
    posts,
    posts::PostService,
    store::ResourceStore,
    trending::TrendingCache,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Communities and rules
    pub communities: Arc<CommunityService>,
    /// Community moderator sets
    pub moderators: Arc<ModeratorRegistry>,
    /// Post reads and edits
    pub posts: Arc<PostService>,
    /// Post removal and the moderation log
    pub moderation: Arc<ModerationWorkflow>,
    /// Process-wide trending snapshot
    pub trending: Arc<TrendingCache>,
    /// Resolves the actor of each request
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Wire the services over one store.
    ///
    /// Community writers share one lock table, post writers another.
    #[must_use]
    pub fn new<S>(
        config: Config,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self
    where
        S: ResourceStore + 'static,
    {
        let community_locks = Arc::new(KeyedLocks::new());
        let post_locks = Arc::new(KeyedLocks::new());

        let communities = CommunityService::new(
            store.clone(),
            Arc::clone(&clock),
            Arc::clone(&community_locks),
        );
        let moderators = ModeratorRegistry::new(store.clone(), community_locks);
        let posts = PostService::new(
            store.clone(),
            store.clone(),
            Arc::clone(&clock),
            Arc::clone(&post_locks),
        );
        let moderation = ModerationWorkflow::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::clone(&clock),
            post_locks,
        );
        let trending = TrendingCache::new(store, clock, config.trending_settings());

        Self {
            config: Arc::new(config),
            communities: Arc::new(communities),
            moderators: Arc::new(moderators),
            posts: Arc::new(posts),
            moderation: Arc::new(moderation),
            trending: Arc::new(trending),
            identity,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    // Every API route sees the resolved actor (or anonymous).
    let api_routes = Router::new()
        .nest("/api/communities", community::router())
        .nest("/api/posts", posts::router())
        .nest("/api/admin", admin::router())
        .layer(from_fn_with_state(state.clone(), auth::resolve_actor));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(api_routes)
        // API documentation
        .merge(api_docs())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether a trending snapshot is currently cached
    trending_cached: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        trending_cached: state.trending.cached_at().await.is_some(),
    })
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Forum Server API"),
    paths(
        community::handlers::create_community,
        community::handlers::list_communities,
        community::handlers::get_community,
        community::handlers::update_community,
        community::handlers::delete_community,
        community::handlers::list_rules,
        community::handlers::create_rule,
        community::handlers::update_rule,
        community::handlers::delete_rule,
        membership::handlers::list_moderators,
        membership::handlers::add_moderator,
        membership::handlers::remove_moderator,
        posts::handlers::create_post,
        posts::handlers::list_posts,
        posts::handlers::trending_posts,
        posts::handlers::get_post,
        posts::handlers::update_post,
        posts::handlers::delete_post,
        admin::handlers::get_moderation_log,
        admin::handlers::purge_trending,
    ),
    tags(
        (name = "communities", description = "Community management"),
        (name = "rules", description = "Community rules"),
        (name = "moderators", description = "Community moderator sets"),
        (name = "posts", description = "Posts and the trending feed"),
        (name = "admin", description = "Platform admin actions")
    )
)]
pub struct ApiDoc;

/// API documentation routes.
fn api_docs() -> Router<AppState> {
    Router::new().route(
        "/api/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
