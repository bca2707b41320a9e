//! Identity provider: who is calling and which teams they belong to.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use docperm_domain::Principal;

/// Resolves the caller of a request into a [`Principal`].
///
/// Called once per request; the resolver itself never looks up team
/// memberships.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// `None` is an anonymous caller.
    async fn principal(&self, user_id: Option<&str>) -> Principal;
}

/// Identity provider backed by an in-memory membership table.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    teams: DashMap<String, BTreeSet<String>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user_id` to `team`.
    pub fn add_membership(&self, user_id: impl Into<String>, team: impl Into<String>) {
        self.teams
            .entry(user_id.into())
            .or_default()
            .insert(team.into());
    }

    /// Builder form of [`Self::add_membership`].
    pub fn with_membership(self, user_id: impl Into<String>, team: impl Into<String>) -> Self {
        self.add_membership(user_id, team);
        self
    }

    pub fn teams_of(&self, user_id: &str) -> BTreeSet<String> {
        self.teams
            .get(user_id)
            .map(|teams| teams.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn principal(&self, user_id: Option<&str>) -> Principal {
        match user_id {
            None => Principal::Anonymous,
            Some(user_id) => {
                let teams = self.teams_of(user_id);
                debug!(user_id, teams = teams.len(), "resolved principal");
                Principal::with_teams(user_id, teams)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_anonymous_caller() {
        let identity = StaticIdentityProvider::new();
        assert_eq!(identity.principal(None).await, Principal::Anonymous);
    }

    #[tokio::test]
    async fn test_memberships_are_attached() {
        let identity = StaticIdentityProvider::new()
            .with_membership("alice", "design")
            .with_membership("alice", "legal")
            .with_membership("bob", "design");

        let alice = identity.principal(Some("alice")).await;
        assert_eq!(alice.user_id(), Some("alice"));
        assert!(alice.is_member_of("design"));
        assert!(alice.is_member_of("legal"));

        let carol = identity.principal(Some("carol")).await;
        assert!(carol.is_authenticated());
        assert!(!carol.is_member_of("design"));
    }
}
