//! Forum Error Types

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::permissions::DenyReason;
use crate::store::StoreError;

/// Resource kinds named in not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Community,
    Rule,
    Post,
    Moderator,
}

impl ResourceKind {
    const fn code(self) -> &'static str {
        match self {
            Self::Community => "COMMUNITY_NOT_FOUND",
            Self::Rule => "RULE_NOT_FOUND",
            Self::Post => "POST_NOT_FOUND",
            Self::Moderator => "MODERATOR_NOT_FOUND",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community => write!(f, "Community"),
            Self::Rule => write!(f, "Rule"),
            Self::Post => write!(f, "Post"),
            Self::Moderator => write!(f, "Moderator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyMember,
    NameTaken,
    /// Lost an optimistic concurrency race (after the internal retry, if any).
    ConcurrentModification,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMember => write!(f, "User is already a moderator"),
            Self::NameTaken => write!(f, "A community with this name already exists"),
            Self::ConcurrentModification => {
                write!(f, "The resource was modified concurrently, try again")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    /// A post needs a body, a URL, or a media reference.
    MissingContent,
    InvalidName(String),
    Validation(String),
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContent => write!(f, "A post must have a body, a URL, or a media file"),
            Self::InvalidName(msg) | Self::Validation(msg) => f.write_str(msg),
        }
    }
}

/// Errors returned by the forum core.
///
/// Denials and not-found are ordinary outcomes that callers turn into a
/// response; only `Store` indicates something actually broke.
#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("{0}")]
    Denied(DenyReason),

    #[error("{0} not found")]
    NotFound(ResourceKind),

    #[error("{0}")]
    Conflict(ConflictKind),

    #[error("{0}")]
    InvalidInput(InvalidInput),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ForumError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName => Self::Conflict(ConflictKind::NameTaken),
            StoreError::VersionConflict => Self::Conflict(ConflictKind::ConcurrentModification),
            other => Self::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for ForumError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidInput(InvalidInput::Validation(err.to_string()))
    }
}

impl ForumError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Denied(reason) => reason.code(),
            Self::NotFound(kind) => kind.code(),
            Self::Conflict(ConflictKind::AlreadyMember) => "ALREADY_MEMBER",
            Self::Conflict(ConflictKind::NameTaken) => "NAME_TAKEN",
            Self::Conflict(ConflictKind::ConcurrentModification) => "CONCURRENT_MODIFICATION",
            Self::InvalidInput(InvalidInput::MissingContent) => "MISSING_CONTENT",
            Self::InvalidInput(InvalidInput::InvalidName(_)) => "INVALID_NAME",
            Self::InvalidInput(InvalidInput::Validation(_)) => "VALIDATION_ERROR",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Denied(DenyReason::Unauthenticated) => StatusCode::UNAUTHORIZED,
            Self::Denied(DenyReason::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Denied(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Store(err) => {
                tracing::error!(error = %err, "Forum store error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(json!({ "error": self.code(), "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ForumError::Denied(DenyReason::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ForumError::Denied(DenyReason::OwnerProtected).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ForumError::NotFound(ResourceKind::Post).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ForumError::Conflict(ConflictKind::AlreadyMember).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ForumError::InvalidInput(InvalidInput::MissingContent).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ForumError::Store(StoreError::Backend("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_conversion() {
        assert!(matches!(
            ForumError::from(StoreError::DuplicateName),
            ForumError::Conflict(ConflictKind::NameTaken)
        ));
        assert!(matches!(
            ForumError::from(StoreError::VersionConflict),
            ForumError::Conflict(ConflictKind::ConcurrentModification)
        ));
        assert!(matches!(
            ForumError::from(StoreError::Missing),
            ForumError::Store(StoreError::Missing)
        ));
    }

    #[test]
    fn test_error_display() {
        assert!(ForumError::NotFound(ResourceKind::Community)
            .to_string()
            .contains("Community not found"));
        assert!(ForumError::Denied(DenyReason::OwnerProtected)
            .to_string()
            .contains("owner"));
        assert_eq!(
            ForumError::Denied(DenyReason::NotMember).code(),
            "NOT_MEMBER"
        );
    }
}
