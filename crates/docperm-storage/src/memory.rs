//! In-memory storage implementation.
//!
//! Resources live in a `DashMap` keyed by id. Each entry owns the
//! resource's direct grants and its grant-set version, so a grant write
//! holds exactly one entry lock while it checks the version and applies
//! the change.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use docperm_domain::{
    AccessGrant, AncestorSnapshot, GrantMutation, LinkPolicy, ResourceKind, ResourceSnapshot,
    Role, Subject,
};

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    validate_id, validate_link, validate_new_resource, validate_subject, AccessStore,
    NewResource, ResourceRecord, WriteOutcome,
};

/// Default bound on the ancestor chain of a document.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

#[derive(Debug, Clone)]
struct ResourceEntry<R> {
    record: ResourceRecord<R>,
    grants: Vec<AccessGrant<R>>,
    version: u64,
}

/// In-memory implementation of AccessStore.
///
/// # Performance Characteristics
///
/// - **Snapshot**: O(D + G) where D is the ancestor depth and G the number
///   of grants along the chain
/// - **Grant write**: O(G) on the resource's own grants (duplicate check)
/// - **Delete resource**: O(S) where S is the size of the subtree
#[derive(Debug)]
pub struct MemoryAccessStore<R> {
    resources: DashMap<String, ResourceEntry<R>>,
    /// Child ids per document, kept sorted for stable listings.
    children: DashMap<String, BTreeSet<String>>,
    max_depth: u32,
}

impl<R: Role> Default for MemoryAccessStore<R> {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl<R: Role> MemoryAccessStore<R> {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Creates a store refusing documents nested deeper than `max_depth`.
    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            resources: DashMap::new(),
            children: DashMap::new(),
            max_depth,
        }
    }

    fn not_found(id: &str) -> StorageError {
        StorageError::ResourceNotFound {
            resource_id: id.to_string(),
        }
    }

    /// Clones an entry so no map lock is held across further lookups.
    fn load(&self, id: &str) -> StorageResult<ResourceEntry<R>> {
        self.resources
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Self::not_found(id))
    }

    /// Computes the materialized path of a new child of `parent_id`.
    fn child_path(&self, resource_id: &str, parent_id: &str) -> StorageResult<Vec<String>> {
        let parent = self
            .resources
            .get(parent_id)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| StorageError::ParentNotFound {
                parent_id: parent_id.to_string(),
            })?;

        if parent.kind != ResourceKind::Document {
            return Err(StorageError::InvalidHierarchy {
                message: format!("{parent_id} is not a document"),
            });
        }

        let mut path = parent.path;
        path.push(parent.id);
        if path.len() > self.max_depth as usize {
            return Err(StorageError::InvalidHierarchy {
                message: format!(
                    "{resource_id} would be nested deeper than {} levels",
                    self.max_depth
                ),
            });
        }
        Ok(path)
    }
}

fn new_grant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn same_subject<R: Role>(grant: &AccessGrant<R>, subject: &Subject) -> bool {
    match subject {
        Subject::User(user_id) => grant.user_id.as_deref() == Some(user_id.as_str()),
        Subject::Team(team) => grant.team.as_deref() == Some(team.as_str()),
    }
}

#[async_trait]
impl<R: Role> AccessStore<R> for MemoryAccessStore<R> {
    #[instrument(skip(self, resource), fields(resource_id = %resource.id))]
    async fn create_resource(
        &self,
        resource: NewResource<R>,
        creator: &str,
    ) -> StorageResult<ResourceRecord<R>> {
        // Validate inputs
        validate_new_resource(&resource)?;
        validate_id("creator", creator)?;

        let path = match &resource.parent_id {
            Some(parent_id) => self.child_path(&resource.id, parent_id)?,
            None => Vec::new(),
        };

        let now = chrono::Utc::now();
        let record = ResourceRecord {
            id: resource.id.clone(),
            kind: resource.kind,
            parent_id: resource.parent_id.clone(),
            path,
            is_public: resource.is_public,
            link: resource.link,
            created_at: now,
            updated_at: now,
        };
        let owner = AccessGrant::new(
            new_grant_id(),
            resource.id.clone(),
            Subject::user(creator),
            R::OWNER,
        );

        // Use atomic entry API to prevent race condition between check and insert
        match self.resources.entry(resource.id.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::ResourceAlreadyExists {
                    resource_id: resource.id,
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(ResourceEntry {
                    record: record.clone(),
                    grants: vec![owner],
                    version: 1,
                });
            }
        }

        if let Some(parent_id) = &record.parent_id {
            self.children
                .entry(parent_id.clone())
                .or_default()
                .insert(record.id.clone());
        }

        debug!(creator, "resource created with owner grant");
        Ok(record)
    }

    async fn get_resource(&self, id: &str) -> StorageResult<ResourceRecord<R>> {
        self.resources
            .get(id)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn delete_resource(&self, id: &str) -> StorageResult<()> {
        let record = self.get_resource(id).await?;

        // Collect the subtree before removing anything.
        let mut subtree = Vec::new();
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if let Some((_, children)) = self.children.remove(&current) {
                queue.extend(children);
            }
            subtree.push(current);
        }

        for resource_id in &subtree {
            self.resources.remove(resource_id);
        }
        if let Some(parent_id) = &record.parent_id {
            if let Some(mut siblings) = self.children.get_mut(parent_id) {
                siblings.remove(id);
            }
        }

        debug!(removed = subtree.len(), "resource subtree deleted");
        Ok(())
    }

    async fn list_children(&self, id: &str) -> StorageResult<Vec<ResourceRecord<R>>> {
        // Verify the parent exists
        self.get_resource(id).await?;

        let child_ids: Vec<String> = self
            .children
            .get(id)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default();

        Ok(child_ids
            .iter()
            .filter_map(|child_id| self.resources.get(child_id).map(|e| e.record.clone()))
            .collect())
    }

    #[instrument(skip(self, link), fields(resource_id = %id))]
    async fn update_link(
        &self,
        id: &str,
        is_public: bool,
        link: Option<LinkPolicy<R>>,
    ) -> StorageResult<ResourceRecord<R>> {
        // Capture timestamp before acquiring lock to minimize lock hold time
        let now = chrono::Utc::now();

        let mut entry = self
            .resources
            .get_mut(id)
            .ok_or_else(|| Self::not_found(id))?;
        validate_link(entry.record.kind, link.as_ref())?;

        entry.record.is_public = is_public;
        entry.record.link = link;
        entry.record.updated_at = now;
        Ok(entry.record.clone())
    }

    async fn list_grants(&self, id: &str) -> StorageResult<Vec<AccessGrant<R>>> {
        Ok(self.load(id)?.grants)
    }

    #[instrument(skip(self), fields(resource_id = %id))]
    async fn snapshot(&self, id: &str) -> StorageResult<ResourceSnapshot<R>> {
        let entry = self.load(id)?;

        let mut ancestors = Vec::with_capacity(entry.record.path.len());
        for ancestor_id in &entry.record.path {
            let ancestor = self.load(ancestor_id)?;
            ancestors.push(AncestorSnapshot {
                id: ancestor.record.id,
                is_public: ancestor.record.is_public,
                grants: ancestor.grants,
            });
        }

        Ok(ResourceSnapshot {
            id: entry.record.id,
            kind: entry.record.kind,
            is_public: entry.record.is_public,
            link: entry.record.link,
            grants: entry.grants,
            ancestors,
            version: entry.version,
        })
    }

    #[instrument(skip(self, mutation), fields(resource_id = %id, op = mutation.op_name()))]
    async fn write_grant(
        &self,
        id: &str,
        expected_version: u64,
        mutation: GrantMutation<R>,
    ) -> StorageResult<WriteOutcome<R>> {
        if let GrantMutation::Create { subject, .. } = &mutation {
            validate_subject(subject)?;
        }

        // The entry stays locked from the version check to the version bump.
        let mut entry = self
            .resources
            .get_mut(id)
            .ok_or_else(|| Self::not_found(id))?;

        if entry.version != expected_version {
            return Err(StorageError::VersionConflict {
                resource_id: id.to_string(),
                expected: expected_version,
                actual: entry.version,
            });
        }

        let grant_not_found = |grant_id: &str| StorageError::GrantNotFound {
            resource_id: id.to_string(),
            grant_id: grant_id.to_string(),
        };

        let grant = match mutation {
            GrantMutation::Create { subject, role } => {
                if entry.grants.iter().any(|grant| same_subject(grant, &subject)) {
                    return Err(StorageError::DuplicateGrant {
                        resource_id: id.to_string(),
                        subject: subject.to_string(),
                    });
                }
                let grant = AccessGrant::new(new_grant_id(), id, subject, role);
                entry.grants.push(grant.clone());
                Some(grant)
            }
            GrantMutation::Update { grant_id, role } => {
                let grant = entry
                    .grants
                    .iter_mut()
                    .find(|grant| grant.id == grant_id)
                    .ok_or_else(|| grant_not_found(&grant_id))?;
                grant.role = role;
                Some(grant.clone())
            }
            GrantMutation::Delete { grant_id } => {
                let position = entry
                    .grants
                    .iter()
                    .position(|grant| grant.id == grant_id)
                    .ok_or_else(|| grant_not_found(&grant_id))?;
                entry.grants.remove(position);
                None
            }
        };

        entry.version += 1;
        debug!(version = entry.version, "grant write applied");
        Ok(WriteOutcome {
            grant,
            version: entry.version,
        })
    }
}
