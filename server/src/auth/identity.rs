//! Identity providers.
//!
//! Token validation happens upstream. The shipped provider trusts the
//! identity headers set by the gateway in front of the server.

use axum::http::HeaderMap;
use forum_common::{Actor, Role};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};

/// Header carrying the actor's UUID.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the actor's platform role. Defaults to `user`.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Source of the current actor for a request.
pub trait IdentityProvider: Send + Sync {
    /// Resolve the actor, or `None` for an anonymous request.
    fn identify(&self, headers: &HeaderMap) -> AuthResult<Option<Actor>>;
}

/// Reads `x-actor-id` / `x-actor-role`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderIdentity;

impl IdentityProvider for HeaderIdentity {
    fn identify(&self, headers: &HeaderMap) -> AuthResult<Option<Actor>> {
        let id = header_str(headers, ACTOR_ID_HEADER)?;
        let role = header_str(headers, ACTOR_ROLE_HEADER)?;

        let Some(id) = id else {
            return match role {
                Some(_) => Err(AuthError::RoleWithoutActor),
                None => Ok(None),
            };
        };

        let id: Uuid = id.trim().parse().map_err(|_| AuthError::MalformedActorId)?;
        let role = match role {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| AuthError::UnknownRole(e.0))?,
            None => Role::User,
        };

        Ok(Some(Actor::new(id, role)))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> AuthResult<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| AuthError::InvalidHeader(name)))
        .transpose()
}
