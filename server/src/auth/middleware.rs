//! Authentication Middleware

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use forum_common::Actor;

use crate::api::AppState;

use super::error::AuthError;

/// Actor of the current request, `None` when anonymous.
///
/// Injected by [`resolve_actor`]. Handlers pass `actor.as_ref()` to the
/// services and let the policy evaluator decide.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    #[must_use]
    pub const fn as_ref(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

/// Middleware resolving the request's actor once.
///
/// Anonymous requests pass through; malformed identity is rejected with 401.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/api/posts", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, resolve_actor))
/// ```
pub async fn resolve_actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let actor = state.identity.identify(request.headers()).inspect_err(|e| {
        tracing::debug!(error = %e, "Rejected request identity");
    })?;

    request.extensions_mut().insert(CurrentActor(actor));
    Ok(next.run(request).await)
}

/// Routes not behind [`resolve_actor`] see an anonymous actor.
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().copied().unwrap_or_default())
    }
}
