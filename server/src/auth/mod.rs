//! Authentication
//!
//! Resolves the current actor from an identity provider. Credentials and
//! tokens are handled before requests reach this server.

mod error;
mod identity;
mod middleware;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use identity::{HeaderIdentity, IdentityProvider, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
pub use middleware::{resolve_actor, CurrentActor};
