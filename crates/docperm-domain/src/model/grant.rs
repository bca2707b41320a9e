//! Access grants: a user or a team holding a role on a resource.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

use super::principal::Principal;
use super::role::Role;

/// Who a grant is given to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    User(String),
    Team(String),
}

impl Subject {
    pub fn user(user_id: impl Into<String>) -> Self {
        Subject::User(user_id.into())
    }

    pub fn team(team: impl Into<String>) -> Self {
        Subject::Team(team.into())
    }

    pub fn borrowed(&self) -> SubjectRef<'_> {
        match self {
            Subject::User(user_id) => SubjectRef::User(user_id),
            Subject::Team(team) => SubjectRef::Team(team),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(user_id) => write!(f, "user:{user_id}"),
            Subject::Team(team) => write!(f, "team:{team}"),
        }
    }
}

/// Borrowed view of a grant's subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectRef<'a> {
    User(&'a str),
    Team(&'a str),
}

impl SubjectRef<'_> {
    /// Returns true if the grant applies to `principal`.
    pub fn matches(&self, principal: &Principal) -> bool {
        match (self, principal) {
            (_, Principal::Anonymous) => false,
            (SubjectRef::User(user), Principal::Authenticated { user_id, .. }) => {
                *user == user_id.as_str()
            }
            (SubjectRef::Team(team), Principal::Authenticated { team_ids, .. }) => {
                team_ids.contains(*team)
            }
        }
    }

    pub fn to_subject(&self) -> Subject {
        match self {
            SubjectRef::User(user_id) => Subject::User(user_id.to_string()),
            SubjectRef::Team(team) => Subject::Team(team.to_string()),
        }
    }
}

/// A row associating a user or a team with a role on a resource.
///
/// Rows come from the store as-is; exactly one of `user_id` and `team` is
/// expected to be set and [`AccessGrant::subject`] enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessGrant<R> {
    pub id: String,
    pub resource_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    pub role: R,
}

impl<R: Role> AccessGrant<R> {
    /// Creates a well-formed grant for `subject`.
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        subject: Subject,
        role: R,
    ) -> Self {
        let (user_id, team) = match subject {
            Subject::User(user_id) => (Some(user_id), None),
            Subject::Team(team) => (None, Some(team)),
        };
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            user_id,
            team,
            role,
        }
    }

    /// Returns the grant's subject, failing on malformed rows.
    pub fn subject(&self) -> DomainResult<SubjectRef<'_>> {
        match (&self.user_id, &self.team) {
            (Some(user_id), None) => Ok(SubjectRef::User(user_id)),
            (None, Some(team)) => Ok(SubjectRef::Team(team)),
            _ => Err(DomainError::InvalidGrant {
                grant_id: self.id.clone(),
            }),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }
}
