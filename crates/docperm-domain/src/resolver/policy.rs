//! Per-kind ability rules.

use crate::model::{DocumentRole, ResourceKind, Role, TemplateRole};

use super::abilities::{AbilityContext, AbilityMap, Action};

/// Rule set plugged into the generic [`AccessResolver`].
///
/// A policy fixes the role lattice and the action set of one resource
/// kind. Resolution and mutation checks are shared; only the ability map
/// differs.
///
/// [`AccessResolver`]: super::AccessResolver
pub trait AccessPolicy: Send + Sync + 'static {
    type Role: Role;

    /// The kind of resource this policy applies to.
    fn kind(&self) -> ResourceKind;

    /// Derives the ability map from a resolved role.
    fn abilities(&self, ctx: &AbilityContext<'_, Self::Role>) -> AbilityMap;
}

/// Abilities on documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentPolicy;

impl AccessPolicy for DocumentPolicy {
    type Role = DocumentRole;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Document
    }

    fn abilities(&self, ctx: &AbilityContext<'_, DocumentRole>) -> AbilityMap {
        let can_get = ctx.can_get();
        let can_update = ctx.can_update();
        let can_manage = ctx.can_manage();
        let is_owner = ctx.is_owner();
        let has_access = ctx.has_access();

        let mut map = AbilityMap::new();
        map.set(Action::AccessesView, has_access)
            .set(Action::AiTransform, can_update)
            .set(Action::AttachmentUpload, can_update)
            .set(Action::ChildrenCreate, can_update && ctx.is_authenticated())
            .set(Action::ChildrenList, can_get)
            .set(Action::Destroy, is_owner)
            .set(Action::Favorite, can_get && ctx.is_authenticated())
            .set(Action::InviteOwner, is_owner)
            .set(Action::LinkConfiguration, can_manage)
            .set(Action::ManageAccesses, can_manage)
            .set(Action::Move, can_manage)
            .set(Action::PartialUpdate, can_update)
            .set(Action::Retrieve, can_get)
            .set(Action::Update, can_update)
            .set(Action::VersionsDestroy, can_manage)
            .set(Action::VersionsList, has_access)
            .set(Action::VersionsRetrieve, has_access);
        map
    }
}

/// Abilities on templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePolicy;

impl AccessPolicy for TemplatePolicy {
    type Role = TemplateRole;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Template
    }

    fn abilities(&self, ctx: &AbilityContext<'_, TemplateRole>) -> AbilityMap {
        let can_get = ctx.can_get();
        let can_update = ctx.can_update();

        let mut map = AbilityMap::new();
        map.set(Action::AccessesView, ctx.has_access())
            .set(Action::Destroy, ctx.is_owner())
            .set(Action::GenerateDocument, can_get)
            .set(Action::ManageAccesses, ctx.can_manage())
            .set(Action::PartialUpdate, can_update)
            .set(Action::Retrieve, can_get)
            .set(Action::Update, can_update);
        map
    }
}
