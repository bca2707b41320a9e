//! AccessStore trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docperm_domain::{
    AccessGrant, GrantMutation, LinkPolicy, ResourceKind, ResourceSnapshot, Role, Subject,
};

use crate::error::{StorageError, StorageResult};

/// Maximum length of resource, grant, user and team identifiers.
pub const MAX_ID_LENGTH: usize = 255;

/// A resource to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResource<R> {
    pub id: String,
    pub kind: ResourceKind,
    /// Parent document. Templates never have one.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "Option::default")]
    pub link: Option<LinkPolicy<R>>,
}

impl<R: Role> NewResource<R> {
    /// A root document with a restricted link.
    pub fn document(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ResourceKind::Document,
            parent_id: None,
            is_public: false,
            link: None,
        }
    }

    pub fn template(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ResourceKind::Template,
            parent_id: None,
            is_public: false,
            link: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn with_link(mut self, link: LinkPolicy<R>) -> Self {
        self.link = Some(link);
        self
    }
}

/// A stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord<R> {
    pub id: String,
    pub kind: ResourceKind,
    pub parent_id: Option<String>,
    /// Ancestor ids, root first (materialized path).
    pub path: Vec<String>,
    pub is_public: bool,
    pub link: Option<LinkPolicy<R>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Result of a grant write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome<R> {
    /// The created or updated grant; `None` after a delete.
    pub grant: Option<AccessGrant<R>>,
    /// Grant-set version after the write.
    pub version: u64,
}

/// Abstract storage interface for resources and their grants.
///
/// Implementations must be thread-safe (Send + Sync) and must apply
/// [`AccessStore::write_grant`] atomically with its version check.
#[async_trait]
pub trait AccessStore<R: Role>: Send + Sync + 'static {
    // Resource operations

    /// Creates a resource and grants `creator` the owner role on it.
    async fn create_resource(
        &self,
        resource: NewResource<R>,
        creator: &str,
    ) -> StorageResult<ResourceRecord<R>>;

    /// Gets a resource by ID.
    async fn get_resource(&self, id: &str) -> StorageResult<ResourceRecord<R>>;

    /// Deletes a resource, its descendants and all their grants.
    async fn delete_resource(&self, id: &str) -> StorageResult<()>;

    /// Lists the direct children of a document, ordered by id.
    async fn list_children(&self, id: &str) -> StorageResult<Vec<ResourceRecord<R>>>;

    /// Replaces a resource's visibility settings.
    async fn update_link(
        &self,
        id: &str,
        is_public: bool,
        link: Option<LinkPolicy<R>>,
    ) -> StorageResult<ResourceRecord<R>>;

    // Grant operations

    /// Lists the direct grants of a resource.
    async fn list_grants(&self, id: &str) -> StorageResult<Vec<AccessGrant<R>>>;

    /// Reads the resource, its ancestor chain and every grant on them in
    /// one batched call.
    async fn snapshot(&self, id: &str) -> StorageResult<ResourceSnapshot<R>>;

    /// Applies `mutation` iff the resource's grant version still equals
    /// `expected_version`.
    ///
    /// Creating a grant for a subject that already has one fails with
    /// [`StorageError::DuplicateGrant`].
    async fn write_grant(
        &self,
        id: &str,
        expected_version: u64,
        mutation: GrantMutation<R>,
    ) -> StorageResult<WriteOutcome<R>>;
}

/// Validates a resource, grant, user or team identifier.
pub fn validate_id(field: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: format!("{field} cannot be empty"),
        });
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(StorageError::InvalidInput {
            message: format!("{field} exceeds {MAX_ID_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Validates a new resource's shape independently of existing data.
pub fn validate_new_resource<R: Role>(resource: &NewResource<R>) -> StorageResult<()> {
    validate_id("resource id", &resource.id)?;
    if let Some(parent_id) = &resource.parent_id {
        validate_id("parent id", parent_id)?;
    }
    validate_link(resource.kind, resource.link.as_ref())?;
    if resource.kind == ResourceKind::Template && resource.parent_id.is_some() {
        return Err(StorageError::InvalidHierarchy {
            message: format!("template {} cannot have a parent", resource.id),
        });
    }
    Ok(())
}

/// Templates cannot be shared by link, and documents may only hand out
/// link roles.
pub fn validate_link<R: Role>(kind: ResourceKind, link: Option<&LinkPolicy<R>>) -> StorageResult<()> {
    match (kind, link) {
        (ResourceKind::Template, Some(_)) => Err(StorageError::InvalidInput {
            message: "templates cannot have a link policy".to_string(),
        }),
        (ResourceKind::Document, Some(link)) if !link.role.is_link_role() => {
            Err(StorageError::InvalidInput {
                message: format!("'{}' cannot be used as a link role", link.role),
            })
        }
        _ => Ok(()),
    }
}

/// Validates the subject of a grant about to be created.
pub fn validate_subject(subject: &Subject) -> StorageResult<()> {
    match subject {
        Subject::User(user_id) => validate_id("user id", user_id),
        Subject::Team(team) => validate_id("team", team),
    }
}
