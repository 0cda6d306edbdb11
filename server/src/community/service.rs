//! Community and rule operations.
//!
//! Every decision goes through the policy evaluator. Writes to one
//! community are serialized with the lock table shared with the moderator
//! registry.

use std::sync::{Arc, LazyLock};

use forum_common::Actor;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ForumError, InvalidInput, ResourceKind};
use crate::locks::KeyedLocks;
use crate::permissions::{authorize, Action, DenyReason, Resource};
use crate::store::{Community, CommunityStore, Rule, StoreError};

/// Maximum community name length.
pub const MAX_NAME_LEN: usize = 21;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z0-9_]+$").expect("community name pattern is valid")
});

/// Check a community name: 1-21 letters, digits or underscores.
pub fn validate_name(name: &str) -> Result<(), ForumError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ForumError::InvalidInput(InvalidInput::InvalidName(format!(
            "Name must be 1-{MAX_NAME_LEN} characters"
        ))));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(ForumError::InvalidInput(InvalidInput::InvalidName(
            "Name may only contain letters, numbers and underscores".to_string(),
        )));
    }
    Ok(())
}

/// Requested community changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CommunityChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Requested rule changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct RuleChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub struct CommunityService {
    store: Arc<dyn CommunityStore>,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks>,
}

impl CommunityService {
    pub fn new(store: Arc<dyn CommunityStore>, clock: Arc<dyn Clock>, locks: Arc<KeyedLocks>) -> Self {
        Self {
            store,
            clock,
            locks,
        }
    }

    /// Create a community owned and moderated by the actor.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        name: String,
        description: Option<String>,
    ) -> Result<Community, ForumError> {
        authorize(actor, Action::Create, Resource::Communities).require(ResourceKind::Community)?;
        let Some(actor) = actor else {
            return Err(ForumError::Denied(DenyReason::Unauthenticated));
        };
        validate_name(&name)?;

        let community = self
            .store
            .insert_community(Community::new(name, description, actor.id, self.clock.now()))
            .await?;

        info!(community_id = %community.id, name = %community.name, owner_id = %actor.id, "Community created");
        Ok(community)
    }

    pub async fn get(&self, community_id: Uuid) -> Result<Community, ForumError> {
        let community = self.fetch(community_id).await?;
        authorize(None, Action::Read, Resource::Community(&community))
            .require(ResourceKind::Community)?;
        Ok(community)
    }

    /// All communities, newest first.
    pub async fn list(&self) -> Result<Vec<Community>, ForumError> {
        authorize(None, Action::Read, Resource::Communities).require(ResourceKind::Community)?;
        Ok(self.store.list_communities().await?)
    }

    /// Rename or re-describe a community. Owner only.
    #[tracing::instrument(skip(self, actor, changes), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        community_id: Uuid,
        changes: CommunityChanges,
    ) -> Result<Community, ForumError> {
        let _guard = self.locks.lock(community_id).await;
        let mut community = self.fetch(community_id).await?;
        authorize(actor, Action::Update, Resource::Community(&community))
            .require(ResourceKind::Community)?;

        if let Some(name) = changes.name {
            validate_name(&name)?;
            community.name = name;
        }
        if let Some(description) = changes.description {
            community.description = Some(description);
        }

        let community = match self.store.persist_community(community).await {
            Ok(saved) => saved,
            Err(StoreError::Missing) => return Err(ForumError::NotFound(ResourceKind::Community)),
            Err(err) => return Err(err.into()),
        };
        info!(community_id = %community.id, "Community updated");
        Ok(community)
    }

    /// Hard delete. Rules, posts and the moderator set go with it.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn delete(&self, actor: Option<&Actor>, community_id: Uuid) -> Result<(), ForumError> {
        let _guard = self.locks.lock(community_id).await;
        let community = self.fetch(community_id).await?;
        authorize(actor, Action::Delete, Resource::Community(&community))
            .require(ResourceKind::Community)?;

        if !self.store.delete_community(community_id).await? {
            return Err(ForumError::NotFound(ResourceKind::Community));
        }

        info!(%community_id, "Community deleted");
        Ok(())
    }

    /// Rules of a community, newest first.
    pub async fn list_rules(&self, community_id: Uuid) -> Result<Vec<Rule>, ForumError> {
        let community = self.fetch(community_id).await?;
        authorize(None, Action::Read, Resource::Rules(&community)).require(ResourceKind::Rule)?;
        Ok(self.store.list_rules(community_id).await?)
    }

    /// Add a rule. Community moderators only.
    #[tracing::instrument(skip(self, actor, description), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn create_rule(
        &self,
        actor: Option<&Actor>,
        community_id: Uuid,
        title: String,
        description: String,
    ) -> Result<Rule, ForumError> {
        let community = self.fetch(community_id).await?;
        authorize(actor, Action::Create, Resource::Rules(&community))
            .require(ResourceKind::Rule)?;

        let rule = Rule {
            id: Uuid::now_v7(),
            community_id,
            title,
            description,
            created_at: self.clock.now(),
        };
        let rule = match self.store.insert_rule(rule).await {
            Ok(rule) => rule,
            Err(StoreError::Missing) => return Err(ForumError::NotFound(ResourceKind::Community)),
            Err(err) => return Err(err.into()),
        };

        info!(%community_id, rule_id = %rule.id, "Rule created");
        Ok(rule)
    }

    /// Edit a rule. Community moderators only.
    #[tracing::instrument(skip(self, actor, changes), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn update_rule(
        &self,
        actor: Option<&Actor>,
        community_id: Uuid,
        rule_id: Uuid,
        changes: RuleChanges,
    ) -> Result<Rule, ForumError> {
        let community = self.fetch(community_id).await?;
        authorize(actor, Action::Update, Resource::Rules(&community))
            .require(ResourceKind::Rule)?;

        let mut rule = self.fetch_rule(community_id, rule_id).await?;
        if let Some(title) = changes.title {
            rule.title = title;
        }
        if let Some(description) = changes.description {
            rule.description = description;
        }

        match self.store.persist_rule(rule).await {
            Ok(rule) => Ok(rule),
            Err(StoreError::Missing) => Err(ForumError::NotFound(ResourceKind::Rule)),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a rule. Community moderators only.
    #[tracing::instrument(skip(self, actor), fields(actor_id = ?actor.map(|a| a.id)))]
    pub async fn delete_rule(
        &self,
        actor: Option<&Actor>,
        community_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), ForumError> {
        let community = self.fetch(community_id).await?;
        authorize(actor, Action::Delete, Resource::Rules(&community))
            .require(ResourceKind::Rule)?;

        self.fetch_rule(community_id, rule_id).await?;
        if !self.store.delete_rule(rule_id).await? {
            return Err(ForumError::NotFound(ResourceKind::Rule));
        }

        info!(%community_id, %rule_id, "Rule deleted");
        Ok(())
    }

    async fn fetch(&self, community_id: Uuid) -> Result<Community, ForumError> {
        self.store
            .fetch_community(community_id)
            .await?
            .ok_or(ForumError::NotFound(ResourceKind::Community))
    }

    /// A rule addressed through a different community does not exist.
    async fn fetch_rule(&self, community_id: Uuid, rule_id: Uuid) -> Result<Rule, ForumError> {
        self.store
            .fetch_rule(rule_id)
            .await?
            .filter(|rule| rule.community_id == community_id)
            .ok_or(ForumError::NotFound(ResourceKind::Rule))
    }
}
