//! Ability maps exposed to API consumers.
//!
//! Both shapes below are serialized verbatim into API responses, so the
//! JSON keys are a compatibility surface for frontends.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::{Principal, ResourceSnapshot, Role};

use super::types::Resolution;

/// An action a principal may perform on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AccessesView,
    AiTransform,
    AttachmentUpload,
    ChildrenCreate,
    ChildrenList,
    Destroy,
    Favorite,
    GenerateDocument,
    InviteOwner,
    LinkConfiguration,
    ManageAccesses,
    Move,
    PartialUpdate,
    Retrieve,
    Update,
    VersionsDestroy,
    VersionsList,
    VersionsRetrieve,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AccessesView => "accesses_view",
            Action::AiTransform => "ai_transform",
            Action::AttachmentUpload => "attachment_upload",
            Action::ChildrenCreate => "children_create",
            Action::ChildrenList => "children_list",
            Action::Destroy => "destroy",
            Action::Favorite => "favorite",
            Action::GenerateDocument => "generate_document",
            Action::InviteOwner => "invite_owner",
            Action::LinkConfiguration => "link_configuration",
            Action::ManageAccesses => "manage_accesses",
            Action::Move => "move",
            Action::PartialUpdate => "partial_update",
            Action::Retrieve => "retrieve",
            Action::Update => "update",
            Action::VersionsDestroy => "versions_destroy",
            Action::VersionsList => "versions_list",
            Action::VersionsRetrieve => "versions_retrieve",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from action to whether it is allowed.
///
/// Serializes as a flat JSON object, e.g. `{"destroy": false, "retrieve": true}`.
/// Actions the resource kind does not define are absent and read as denied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AbilityMap(BTreeMap<Action, bool>);

impl AbilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, action: Action, allowed: bool) -> &mut Self {
        self.0.insert(action, allowed);
        self
    }

    /// Returns true if `action` is defined and allowed.
    pub fn allows(&self, action: Action) -> bool {
        self.0.get(&action).copied().unwrap_or(false)
    }

    /// Returns the entry for `action`, `None` if the resource kind does not
    /// define it.
    pub fn get(&self, action: Action) -> Option<bool> {
        self.0.get(&action).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, bool)> + '_ {
        self.0.iter().map(|(action, allowed)| (*action, *allowed))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Abilities of a principal on one grant row of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantAbilities<R> {
    pub destroy: bool,
    pub update: bool,
    pub partial_update: bool,
    pub retrieve: bool,
    /// Roles the principal may change the grant to, highest first.
    pub set_role_to: Vec<R>,
}

/// Inputs shared by every ability rule.
#[derive(Debug, Clone, Copy)]
pub struct AbilityContext<'a, R> {
    pub principal: &'a Principal,
    pub snapshot: &'a ResourceSnapshot<R>,
    pub resolution: &'a Resolution<R>,
}

impl<'a, R: Role> AbilityContext<'a, R> {
    pub fn new(
        principal: &'a Principal,
        snapshot: &'a ResourceSnapshot<R>,
        resolution: &'a Resolution<R>,
    ) -> Self {
        Self {
            principal,
            snapshot,
            resolution,
        }
    }

    /// Retrieval is allowed with any role, or when the resource or an
    /// ancestor carries the legacy public flag.
    pub fn can_get(&self) -> bool {
        self.resolution.role.is_some() || self.snapshot.is_publicly_visible()
    }

    pub fn can_update(&self) -> bool {
        self.resolution.can_update()
    }

    pub fn can_manage(&self) -> bool {
        self.resolution.can_manage()
    }

    pub fn is_owner(&self) -> bool {
        self.resolution.is_owner()
    }

    pub fn has_access(&self) -> bool {
        self.resolution.has_access()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_authenticated()
    }
}
