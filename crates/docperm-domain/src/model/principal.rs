//! The authenticated (or anonymous) caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The principal a role is resolved for.
///
/// Team membership is resolved once per request by the identity
/// collaborator; the resolver never looks it up itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Anonymous,
    Authenticated {
        user_id: String,
        #[serde(default)]
        team_ids: BTreeSet<String>,
    },
}

impl Principal {
    /// Creates an authenticated principal without team memberships.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Principal::Authenticated {
            user_id: user_id.into(),
            team_ids: BTreeSet::new(),
        }
    }

    /// Creates an authenticated principal belonging to the given teams.
    pub fn with_teams<I, T>(user_id: impl Into<String>, teams: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Principal::Authenticated {
            user_id: user_id.into(),
            team_ids: teams.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated { user_id, .. } => Some(user_id),
        }
    }

    pub fn is_member_of(&self, team: &str) -> bool {
        match self {
            Principal::Anonymous => false,
            Principal::Authenticated { team_ids, .. } => team_ids.contains(team),
        }
    }
}
