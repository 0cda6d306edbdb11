//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures while resolving the actor of a request.
///
/// A request without identity is not an error; it is served anonymously
/// and the policy evaluator decides.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Identity header is not valid UTF-8.
    #[error("Invalid identity header: {0}")]
    InvalidHeader(&'static str),

    /// Actor ID is not a UUID.
    #[error("Malformed actor ID")]
    MalformedActorId,

    /// Role header names no known role.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Role supplied without an actor ID.
    #[error("Role header requires an actor ID")]
    RoleWithoutActor,
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = match &self {
            Self::InvalidHeader(_) => "INVALID_AUTH_HEADER",
            Self::MalformedActorId => "INVALID_ACTOR_ID",
            Self::UnknownRole(_) => "INVALID_ROLE",
            Self::RoleWithoutActor => "MISSING_ACTOR_ID",
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
