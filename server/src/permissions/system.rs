//! System-level permissions for administrative actions.
//!
//! These are the only permissions derived from an actor's platform role.
//! Everything community-scoped goes through the resolver instead.

use forum_common::Actor;

use super::models::{Decision, DenyReason};

/// Platform-wide permission held by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPermission {
    /// Read the log of post removals across all communities
    ViewModerationLog,
    /// Drop the trending snapshot so it is recomputed on next read
    PurgeTrendingCache,
}

impl SystemPermission {
    /// Returns the action name for audit logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use forum_server::permissions::SystemPermission;
    ///
    /// let perm = SystemPermission::PurgeTrendingCache;
    /// assert_eq!(perm.action_name(), "purge_trending_cache");
    /// ```
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::ViewModerationLog => "view_moderation_log",
            Self::PurgeTrendingCache => "purge_trending_cache",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ViewModerationLog, Self::PurgeTrendingCache]
    }
}

/// Check a system permission. Only the admin role holds them.
pub fn check_system_permission(actor: Option<&Actor>, permission: SystemPermission) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    if actor.is_admin() {
        Decision::Allow
    } else {
        tracing::debug!(
            actor_id = %actor.id,
            action = permission.action_name(),
            "System permission denied"
        );
        Decision::Deny(DenyReason::NotAdmin)
    }
}
