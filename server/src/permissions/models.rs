//! Policy evaluator inputs and outputs.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{ForumError, ResourceKind};
use crate::store::{Community, Post};

/// What an actor is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Membership: add a moderator.
    Add,
    /// Membership: remove a moderator.
    Remove,
}

/// The object an action is evaluated against.
///
/// Scoped resources carry the community whose moderator set decides.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// The community collection (creation).
    Communities,
    Community(&'a Community),
    /// Rules of a community.
    Rules(&'a Community),
    /// Posts of a community (creation).
    Posts(&'a Community),
    Post {
        post: &'a Post,
        community: &'a Community,
    },
    /// Moderator set of a community; `target` is the affected user.
    Membership {
        community: &'a Community,
        target: Option<Uuid>,
    },
}

/// Why an action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No actor on the request.
    Unauthenticated,
    NotOwner,
    NotModerator,
    NotMember,
    /// The community owner can never leave the moderator set.
    OwnerProtected,
    /// Platform admin role required.
    NotAdmin,
    /// The resource is invisible to reads.
    NotFound,
    /// The action is not defined for the resource.
    Unsupported,
}

impl DenyReason {
    /// Stable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotOwner => "NOT_OWNER",
            Self::NotModerator => "NOT_MODERATOR",
            Self::NotMember => "NOT_MEMBER",
            Self::OwnerProtected => "OWNER_PROTECTED",
            Self::NotAdmin => "NOT_ADMIN",
            Self::NotFound => "NOT_FOUND",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Authentication required"),
            Self::NotOwner => write!(f, "Only the owner can do this"),
            Self::NotModerator => write!(f, "Only community moderators can do this"),
            Self::NotMember => write!(f, "You must be a member of this community to post"),
            Self::OwnerProtected => {
                write!(f, "The community owner cannot be removed as a moderator")
            }
            Self::NotAdmin => write!(f, "Platform admin required"),
            Self::NotFound => write!(f, "Resource not found"),
            Self::Unsupported => write!(f, "Action not supported for this resource"),
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Allow only if `condition` holds.
    #[must_use]
    pub const fn allow_if(condition: bool, otherwise: DenyReason) -> Self {
        if condition {
            Self::Allow
        } else {
            Self::Deny(otherwise)
        }
    }

    /// Convert into a result for `?` propagation.
    ///
    /// A `NotFound` denial surfaces as `ForumError::NotFound(kind)` so hidden
    /// resources look exactly like missing ones.
    pub fn require(self, kind: ResourceKind) -> Result<(), ForumError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::NotFound) => Err(ForumError::NotFound(kind)),
            Self::Deny(reason) => Err(ForumError::Denied(reason)),
        }
    }
}
