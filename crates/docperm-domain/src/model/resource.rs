//! Resource snapshots handed to the resolver.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::grant::AccessGrant;
use super::role::Role;

/// The kind of resource a snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Template,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Document => f.write_str("document"),
            ResourceKind::Template => f.write_str("template"),
        }
    }
}

/// Who may use a resource's shareable link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkReach {
    #[default]
    Restricted,
    Authenticated,
    Public,
}

/// Link sharing settings of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPolicy<R> {
    pub reach: LinkReach,
    pub role: R,
}

impl<R> LinkPolicy<R> {
    pub fn new(reach: LinkReach, role: R) -> Self {
        Self { reach, role }
    }
}

/// One ancestor of a document, with its direct grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorSnapshot<R> {
    pub id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "Vec::new")]
    pub grants: Vec<AccessGrant<R>>,
}

/// Everything the resolver needs to know about one resource.
///
/// Built by the store in a single batched read: the resource's own grants,
/// its link settings and the grants of every ancestor, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot<R> {
    pub id: String,
    pub kind: ResourceKind,
    /// Legacy visibility flag. Grants retrieval only, never a role.
    #[serde(default)]
    pub is_public: bool,
    /// Link sharing settings. Always `None` for templates.
    #[serde(default = "Option::default")]
    pub link: Option<LinkPolicy<R>>,
    #[serde(default = "Vec::new")]
    pub grants: Vec<AccessGrant<R>>,
    /// Ancestors ordered from the root to the immediate parent.
    #[serde(default = "Vec::new")]
    pub ancestors: Vec<AncestorSnapshot<R>>,
    /// Revision of this resource's grant set at read time.
    #[serde(default)]
    pub version: u64,
}

impl<R: Role> ResourceSnapshot<R> {
    /// Creates a snapshot with no grants, no ancestors and a restricted link.
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            is_public: false,
            link: None,
            grants: Vec::new(),
            ancestors: Vec::new(),
            version: 0,
        }
    }

    pub fn document(id: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Document)
    }

    pub fn template(id: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Template)
    }

    pub fn with_link(mut self, reach: LinkReach, role: R) -> Self {
        self.link = Some(LinkPolicy::new(reach, role));
        self
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn with_grant(mut self, grant: AccessGrant<R>) -> Self {
        self.grants.push(grant);
        self
    }

    /// Appends an ancestor below the ones already present.
    pub fn with_ancestor(mut self, ancestor: AncestorSnapshot<R>) -> Self {
        self.ancestors.push(ancestor);
        self
    }

    pub fn link_reach(&self) -> LinkReach {
        self.link.map(|link| link.reach).unwrap_or_default()
    }

    /// Number of owner grants held directly on this resource.
    ///
    /// Ancestor grants never count: ownership is per resource.
    pub fn direct_owner_count(&self) -> usize {
        self.grants.iter().filter(|grant| grant.is_owner()).count()
    }

    /// Finds a direct grant of this resource by id.
    pub fn find_grant(&self, grant_id: &str) -> Option<&AccessGrant<R>> {
        self.grants.iter().find(|grant| grant.id == grant_id)
    }

    /// True if the resource or any of its ancestors carries the legacy
    /// public flag.
    pub fn is_publicly_visible(&self) -> bool {
        self.is_public || self.ancestors.iter().any(|ancestor| ancestor.is_public)
    }

    /// Grants in scope for resolution: ancestors root first, then the
    /// resource's own grants.
    pub fn grants_in_scope(&self) -> impl Iterator<Item = &AccessGrant<R>> {
        self.ancestors
            .iter()
            .flat_map(|ancestor| ancestor.grants.iter())
            .chain(self.grants.iter())
    }

    /// Ancestor ids, root first.
    pub fn ancestor_ids(&self) -> impl Iterator<Item = &str> {
        self.ancestors.iter().map(|ancestor| ancestor.id.as_str())
    }
}

impl<R> AncestorSnapshot<R> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_public: false,
            grants: Vec::new(),
        }
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn with_grant(mut self, grant: AccessGrant<R>) -> Self {
        self.grants.push(grant);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentRole, Subject};

    fn grant(
        id: &str,
        resource: &str,
        user: &str,
        role: DocumentRole,
    ) -> AccessGrant<DocumentRole> {
        AccessGrant::new(id, resource, Subject::user(user), role)
    }

    #[test]
    fn test_direct_owner_count_ignores_ancestors() {
        let snapshot = ResourceSnapshot::document("child")
            .with_ancestor(
                AncestorSnapshot::new("root")
                    .with_grant(grant("g0", "root", "zoe", DocumentRole::Owner)),
            )
            .with_grant(grant("g1", "child", "alice", DocumentRole::Owner))
            .with_grant(grant("g2", "child", "bob", DocumentRole::Editor));

        assert_eq!(snapshot.direct_owner_count(), 1);
        assert_eq!(snapshot.grants_in_scope().count(), 3);
        assert!(snapshot.find_grant("g0").is_none());
        assert!(snapshot.find_grant("g2").is_some());
    }

    #[test]
    fn test_grants_in_scope_are_root_first() {
        let snapshot = ResourceSnapshot::document("c")
            .with_ancestor(
                AncestorSnapshot::new("a").with_grant(grant("ga", "a", "u", DocumentRole::Reader)),
            )
            .with_ancestor(
                AncestorSnapshot::new("b").with_grant(grant("gb", "b", "u", DocumentRole::Reader)),
            )
            .with_grant(grant("gc", "c", "u", DocumentRole::Reader));

        let ids: Vec<&str> = snapshot.grants_in_scope().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["ga", "gb", "gc"]);
        assert_eq!(snapshot.ancestor_ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_public_visibility_flows_from_ancestors() {
        let snapshot: ResourceSnapshot<DocumentRole> = ResourceSnapshot::document("child")
            .with_ancestor(AncestorSnapshot::new("root").with_public(true));
        assert!(!snapshot.is_public);
        assert!(snapshot.is_publicly_visible());
    }

    #[test]
    fn test_missing_link_is_restricted() {
        let snapshot: ResourceSnapshot<DocumentRole> = ResourceSnapshot::document("doc");
        assert_eq!(snapshot.link_reach(), LinkReach::Restricted);
    }
}
