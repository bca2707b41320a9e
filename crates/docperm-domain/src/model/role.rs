//! Role lattices.
//!
//! Roles are totally ordered; a higher role includes every ability of the
//! roles below it. Documents and templates use different lattices, both
//! expressed through the [`Role`] trait so the resolver can be generic.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A role in a totally ordered lattice.
pub trait Role:
    Copy
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// The top of the lattice.
    const OWNER: Self;
    /// The lowest role allowed to manage accesses.
    const ADMINISTRATOR: Self;
    /// The lowest role allowed to change the resource's content.
    const UPDATE_THRESHOLD: Self;
    /// Every role, lowest first.
    const ALL: &'static [Self];
    /// Roles a link policy may hand out.
    const LINK_ROLES: &'static [Self];

    /// Stable lowercase name, identical to the serde representation.
    fn as_str(&self) -> &'static str;

    fn is_owner(&self) -> bool {
        *self == Self::OWNER
    }

    /// True for administrator and above.
    fn can_manage(&self) -> bool {
        *self >= Self::ADMINISTRATOR
    }

    fn is_link_role(&self) -> bool {
        Self::LINK_ROLES.contains(self)
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// Roles on a document: `reader < editor < administrator < owner`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRole {
    Reader,
    Editor,
    Administrator,
    Owner,
}

impl Role for DocumentRole {
    const OWNER: Self = DocumentRole::Owner;
    const ADMINISTRATOR: Self = DocumentRole::Administrator;
    const UPDATE_THRESHOLD: Self = DocumentRole::Editor;
    const ALL: &'static [Self] = &[
        DocumentRole::Reader,
        DocumentRole::Editor,
        DocumentRole::Administrator,
        DocumentRole::Owner,
    ];
    const LINK_ROLES: &'static [Self] = &[DocumentRole::Reader, DocumentRole::Editor];

    fn as_str(&self) -> &'static str {
        match self {
            DocumentRole::Reader => "reader",
            DocumentRole::Editor => "editor",
            DocumentRole::Administrator => "administrator",
            DocumentRole::Owner => "owner",
        }
    }
}

impl FromStr for DocumentRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles on a template: `member < administrator < owner`.
///
/// Templates cannot be shared by link, so no role is a link role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TemplateRole {
    Member,
    Administrator,
    Owner,
}

impl Role for TemplateRole {
    const OWNER: Self = TemplateRole::Owner;
    const ADMINISTRATOR: Self = TemplateRole::Administrator;
    const UPDATE_THRESHOLD: Self = TemplateRole::Administrator;
    const ALL: &'static [Self] = &[
        TemplateRole::Member,
        TemplateRole::Administrator,
        TemplateRole::Owner,
    ];
    const LINK_ROLES: &'static [Self] = &[];

    fn as_str(&self) -> &'static str {
        match self {
            TemplateRole::Member => "member",
            TemplateRole::Administrator => "administrator",
            TemplateRole::Owner => "owner",
        }
    }
}

impl FromStr for TemplateRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

impl fmt::Display for TemplateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
