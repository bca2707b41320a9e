//! Types for the access resolver.

use serde::{Deserialize, Serialize};

use crate::model::{Role, Subject};

/// Outcome of resolving a principal's role on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution<R> {
    /// Best role granted by user or team grants on the resource or any
    /// ancestor.
    pub access_role: Option<R>,
    /// Role granted by the link policy, if the principal's standing
    /// satisfies the link reach.
    pub link_role: Option<R>,
    /// Effective role: the maximum of both.
    pub role: Option<R>,
}

impl<R: Role> Resolution<R> {
    pub(crate) fn new(access_role: Option<R>, link_role: Option<R>) -> Self {
        Self {
            access_role,
            link_role,
            role: access_role.max(link_role),
        }
    }

    /// Resolution for a principal with no access at all.
    pub fn none() -> Self {
        Self::new(None, None)
    }

    /// True when the principal holds a real grant (not only link access).
    pub fn has_access(&self) -> bool {
        self.access_role.is_some()
    }

    pub fn is_owner(&self) -> bool {
        self.role.is_some_and(|role| role.is_owner())
    }

    /// True for administrator and above.
    pub fn can_manage(&self) -> bool {
        self.role.is_some_and(|role| role.can_manage())
    }

    /// True when the effective role may change the resource's content.
    pub fn can_update(&self) -> bool {
        self.role.is_some_and(|role| role >= R::UPDATE_THRESHOLD)
    }
}

/// A change to a resource's grants, checked before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GrantMutation<R> {
    /// Grant `role` to a new subject.
    Create { subject: Subject, role: R },
    /// Change the role of an existing grant.
    Update { grant_id: String, role: R },
    /// Revoke an existing grant.
    Delete { grant_id: String },
}

impl<R: Role> GrantMutation<R> {
    /// The existing grant this mutation targets, if any.
    pub fn grant_id(&self) -> Option<&str> {
        match self {
            GrantMutation::Create { .. } => None,
            GrantMutation::Update { grant_id, .. } | GrantMutation::Delete { grant_id } => {
                Some(grant_id)
            }
        }
    }

    /// The role the mutation writes, if any.
    pub fn new_role(&self) -> Option<R> {
        match self {
            GrantMutation::Create { role, .. } | GrantMutation::Update { role, .. } => Some(*role),
            GrantMutation::Delete { .. } => None,
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            GrantMutation::Create { .. } => "create",
            GrantMutation::Update { .. } => "update",
            GrantMutation::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentRole;

    #[test]
    fn test_resolution_takes_the_maximum() {
        let resolution = Resolution::new(Some(DocumentRole::Reader), Some(DocumentRole::Editor));
        assert_eq!(resolution.role, Some(DocumentRole::Editor));
        assert!(resolution.has_access());
        assert!(resolution.can_update());
        assert!(!resolution.can_manage());

        let link_only = Resolution::new(None, Some(DocumentRole::Reader));
        assert_eq!(link_only.role, Some(DocumentRole::Reader));
        assert!(!link_only.has_access());
    }

    #[test]
    fn test_empty_resolution() {
        let resolution = Resolution::<DocumentRole>::none();
        assert_eq!(resolution.role, None);
        assert!(!resolution.can_update());
        assert!(!resolution.is_owner());
    }

    #[test]
    fn test_mutation_json_shape() {
        let mutation: GrantMutation<DocumentRole> = serde_json::from_str(
            r#"{"op":"create","subject":{"team":"legal"},"role":"editor"}"#,
        )
        .unwrap();
        assert_eq!(
            mutation,
            GrantMutation::Create {
                subject: Subject::team("legal"),
                role: DocumentRole::Editor,
            }
        );
        assert_eq!(mutation.grant_id(), None);
        assert_eq!(mutation.new_role(), Some(DocumentRole::Editor));
    }
}
