//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router over a fresh in-memory store, plus small builders for actors,
//! communities and posts.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use forum_common::{Actor, Role};
use forum_server::api::{create_router, AppState};
use forum_server::auth::{HeaderIdentity, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use forum_server::clock::ManualClock;
use forum_server::config::Config;
use forum_server::store::{MemoryStore, Post, PostState, PostStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app with its own store and a manual clock.
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test())
    }

    /// Create a test app with a custom config.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state = AppState::new(
            config.clone(),
            store.clone(),
            clock.clone(),
            Arc::new(HeaderIdentity),
        );

        Self {
            router: create_router(state),
            store,
            clock,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Build a request carrying the actor's identity headers.
    pub fn request_as(actor: &Actor, method: Method, uri: &str) -> http::request::Builder {
        Self::request(method, uri)
            .header(ACTOR_ID_HEADER, actor.id.to_string())
            .header(ACTOR_ROLE_HEADER, actor.role.as_str())
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send a request as `actor` (or anonymously) with an optional JSON body.
    pub async fn send(
        &self,
        actor: Option<&Actor>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let builder = match actor {
            Some(actor) => Self::request_as(actor, method, uri),
            None => Self::request(method, uri),
        };
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.oneshot(request).await
    }

    /// Create a community over HTTP and return its ID.
    pub async fn create_community(&self, owner: &Actor, name: &str) -> Uuid {
        let resp = self
            .send(
                Some(owner),
                Method::POST,
                "/api/communities",
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        json_id(&body_to_json(resp).await)
    }

    /// Add a moderator over HTTP.
    pub async fn add_moderator(&self, owner: &Actor, community_id: Uuid, user_id: Uuid) {
        let resp = self
            .send(
                Some(owner),
                Method::POST,
                &format!("/api/communities/{community_id}/moderators"),
                Some(json!({ "user_id": user_id })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    /// Create a text post over HTTP and return its ID.
    pub async fn create_post(&self, author: &Actor, community_id: Uuid, title: &str) -> Uuid {
        let resp = self
            .send(
                Some(author),
                Method::POST,
                "/api/posts",
                Some(json!({
                    "community_id": community_id,
                    "title": title,
                    "body": "Post body"
                })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        json_id(&body_to_json(resp).await)
    }

    /// Insert a post directly with a given vote count and creation time.
    pub async fn seed_post(
        &self,
        community_id: Uuid,
        votes: i64,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let post = self
            .store
            .insert_post(Post {
                id: Uuid::now_v7(),
                community_id,
                owner_id: Uuid::new_v4(),
                title: format!("{votes} votes"),
                body: Some("seeded".into()),
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
            .expect("failed to seed post");
        post.id
    }
}

// ============================================================================
// Actors
// ============================================================================

pub fn user() -> Actor {
    Actor::user(Uuid::new_v4())
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin)
}

// ============================================================================
// Response helpers
// ============================================================================

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// Read the `id` field of a JSON object.
pub fn json_id(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("missing id in {value}"))
}

/// Assert an error response's status and code.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], code, "unexpected body: {json}");
}
