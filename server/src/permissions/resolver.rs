//! Permission resolution logic.
//!
//! Decides whether an actor may perform an action on a forum resource.
//! Pure: everything needed is passed in.

use forum_common::Actor;

use super::models::{Action, Decision, DenyReason, Resource};

/// Evaluate an action against a resource.
///
/// Resolution order (first match wins):
/// 1. Public reads (communities, rules, moderator lists) are always allowed
/// 2. Post reads are allowed unless the post was removed, for every actor
/// 3. Anything else requires an actor
/// 4. Ownership or moderator-set membership of the scoped community decides
pub fn authorize(actor: Option<&Actor>, action: Action, resource: Resource<'_>) -> Decision {
    match (resource, action) {
        (Resource::Community(_) | Resource::Communities, Action::Read)
        | (Resource::Rules(_), Action::Read)
        | (Resource::Membership { .. }, Action::Read) => Decision::Allow,

        (Resource::Post { post, .. }, Action::Read) => {
            Decision::allow_if(!post.is_removed(), DenyReason::NotFound)
        }

        _ => {
            let Some(actor) = actor else {
                return Decision::Deny(DenyReason::Unauthenticated);
            };
            authorize_actor(actor, action, resource)
        }
    }
}

fn authorize_actor(actor: &Actor, action: Action, resource: Resource<'_>) -> Decision {
    match (resource, action) {
        (Resource::Communities, Action::Create) => Decision::Allow,

        (Resource::Community(community), Action::Update | Action::Delete) => {
            Decision::allow_if(community.is_owner(actor.id), DenyReason::NotOwner)
        }

        (Resource::Rules(community), Action::Create | Action::Update | Action::Delete) => {
            Decision::allow_if(community.is_moderator(actor.id), DenyReason::NotModerator)
        }

        (Resource::Posts(community), Action::Create) => {
            Decision::allow_if(community.is_moderator(actor.id), DenyReason::NotMember)
        }

        // Moderators cannot edit other people's posts.
        (Resource::Post { post, .. }, Action::Update) => {
            Decision::allow_if(post.owner_id == actor.id, DenyReason::NotOwner)
        }

        (Resource::Post { post, community }, Action::Delete) => Decision::allow_if(
            post.owner_id == actor.id || community.is_moderator(actor.id),
            DenyReason::NotModerator,
        ),

        (Resource::Membership { community, .. }, Action::Add) => {
            Decision::allow_if(community.is_owner(actor.id), DenyReason::NotOwner)
        }

        (Resource::Membership { community, target }, Action::Remove) => {
            if !community.is_owner(actor.id) {
                Decision::Deny(DenyReason::NotOwner)
            } else if target.is_some_and(|t| community.is_owner(t)) {
                Decision::Deny(DenyReason::OwnerProtected)
            } else {
                Decision::Allow
            }
        }

        _ => Decision::Deny(DenyReason::Unsupported),
    }
}
