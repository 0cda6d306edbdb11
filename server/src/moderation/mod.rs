//! Moderation
//!
//! Soft-delete workflow for posts and the moderation log it writes.

pub mod workflow;

pub use workflow::{ModerationAction, ModerationWorkflow, RemovalOutcome, REDACTION_MARKER};
