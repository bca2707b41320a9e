//! Access service: identity -> snapshot -> resolver -> guarded write.
//!
//! Every request resolves its principal exactly once. Reads take one
//! snapshot; grant writes take one snapshot per attempt and hand its
//! version to the store, re-reading and re-checking on a version
//! conflict.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use docperm_domain::{
    AbilityMap, AccessGrant, AccessPolicy, AccessResolver, Action, DomainError, GrantAbilities,
    GrantMutation, LinkPolicy, Principal, ResolverConfig, ResourceKind, Subject,
};
use docperm_storage::{AccessStore, NewResource, ResourceRecord, StorageError, WriteOutcome};

use crate::config::AccessSettings;
use crate::identity::IdentityProvider;

/// Errors returned by the access service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The principal's ability map does not allow the action.
    #[error("{action} is not allowed on resource {resource_id}")]
    ActionDenied { resource_id: String, action: Action },

    /// The operation needs an authenticated caller.
    #[error("authentication required")]
    Unauthenticated,

    /// Every write attempt lost against a concurrent grant change.
    #[error("grants of resource {resource_id} kept changing; gave up after {attempts} attempts")]
    WriteContention { resource_id: String, attempts: u32 },
}

/// Coarse classification of [`ServiceError`] for an API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Invalid,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(err) if err.is_integrity_error() => ErrorKind::Internal,
            ServiceError::Domain(DomainError::GrantNotFound { .. }) => ErrorKind::NotFound,
            ServiceError::Domain(_) => ErrorKind::Forbidden,
            ServiceError::Storage(err) if err.is_not_found() => ErrorKind::NotFound,
            ServiceError::Storage(
                StorageError::InvalidInput { .. } | StorageError::InvalidHierarchy { .. },
            ) => ErrorKind::Invalid,
            ServiceError::Storage(_) => ErrorKind::Conflict,
            ServiceError::ActionDenied { .. } => ErrorKind::Forbidden,
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::WriteContention { .. } => ErrorKind::Conflict,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A direct grant together with what the caller may do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantView<R> {
    #[serde(flatten)]
    pub grant: AccessGrant<R>,
    pub abilities: GrantAbilities<R>,
}

/// Orchestrates the identity provider, the store and the resolver for one
/// resource kind.
pub struct AccessService<S, P: AccessPolicy> {
    store: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
    resolver: AccessResolver<P>,
    max_write_attempts: u32,
}

impl<S, P> AccessService<S, P>
where
    P: AccessPolicy,
    S: AccessStore<P::Role>,
{
    pub fn new(
        store: Arc<S>,
        identity: Arc<dyn IdentityProvider>,
        resolver: AccessResolver<P>,
    ) -> Self {
        Self {
            store,
            identity,
            resolver,
            max_write_attempts: 3,
        }
    }

    /// Builds a service with the resolver depth limit and write retry
    /// budget taken from configuration.
    pub fn from_settings(
        store: Arc<S>,
        identity: Arc<dyn IdentityProvider>,
        policy: P,
        settings: &AccessSettings,
    ) -> Self {
        let config = ResolverConfig::default().with_max_depth(settings.max_ancestor_depth);
        Self::new(store, identity, AccessResolver::with_config(policy, config))
            .with_max_write_attempts(settings.max_write_attempts)
    }

    /// Sets how many times a conflicting grant write is re-checked. At
    /// least one attempt is always made.
    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn resolver(&self) -> &AccessResolver<P> {
        &self.resolver
    }

    // Reads

    /// Ability map of the caller on a resource.
    #[instrument(skip(self, user_id), fields(resource_id = %resource_id))]
    pub async fn abilities(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
    ) -> ServiceResult<AbilityMap> {
        let principal = self.identity.principal(user_id).await;
        self.abilities_for(&principal, resource_id).await
    }

    /// Direct grants of a resource, each with the caller's abilities on it.
    #[instrument(skip(self, user_id), fields(resource_id = %resource_id))]
    pub async fn grant_abilities(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
    ) -> ServiceResult<Vec<GrantView<P::Role>>> {
        let principal = self.identity.principal(user_id).await;
        let snapshot = self.store.snapshot(resource_id).await?;
        let resolution = self
            .resolver
            .resolve(&principal, &snapshot)
            .map_err(report)?;
        let abilities = self
            .resolver
            .compute_abilities(&principal, &snapshot, &resolution);
        require(resource_id, &abilities, Action::AccessesView)?;

        Ok(snapshot
            .grants
            .iter()
            .map(|grant| GrantView {
                grant: grant.clone(),
                abilities: self.resolver.grant_abilities(&snapshot, &resolution, grant),
            })
            .collect())
    }

    /// Children of a document, if the caller may list them.
    #[instrument(skip(self, user_id), fields(resource_id = %resource_id))]
    pub async fn list_children(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
    ) -> ServiceResult<Vec<ResourceRecord<P::Role>>> {
        let principal = self.identity.principal(user_id).await;
        let abilities = self.abilities_for(&principal, resource_id).await?;
        require(resource_id, &abilities, Action::ChildrenList)?;
        Ok(self.store.list_children(resource_id).await?)
    }

    // Resources

    /// Creates a resource owned by the caller. Creating a child requires
    /// `children_create` on the parent.
    #[instrument(skip(self, user_id, resource), fields(resource_id = %resource.id))]
    pub async fn create_resource(
        &self,
        user_id: Option<&str>,
        resource: NewResource<P::Role>,
    ) -> ServiceResult<ResourceRecord<P::Role>> {
        let expected = self.resolver.policy().kind();
        if resource.kind != expected {
            return Err(DomainError::ResourceKindMismatch {
                resource_id: resource.id,
                expected: expected.to_string(),
                actual: resource.kind.to_string(),
            }
            .into());
        }

        let principal = self.identity.principal(user_id).await;
        let creator = principal
            .user_id()
            .ok_or(ServiceError::Unauthenticated)?
            .to_string();
        if let Some(parent_id) = &resource.parent_id {
            let abilities = self.abilities_for(&principal, parent_id).await?;
            require(parent_id, &abilities, Action::ChildrenCreate)?;
        }

        let record = self.store.create_resource(resource, &creator).await?;
        info!(creator = %creator, "resource created");
        Ok(record)
    }

    /// Changes the public flag and link policy of a resource.
    #[instrument(skip(self, user_id, link), fields(resource_id = %resource_id))]
    pub async fn update_visibility(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
        is_public: bool,
        link: Option<LinkPolicy<P::Role>>,
    ) -> ServiceResult<ResourceRecord<P::Role>> {
        let principal = self.identity.principal(user_id).await;
        let abilities = self.abilities_for(&principal, resource_id).await?;
        let action = match self.resolver.policy().kind() {
            ResourceKind::Document => Action::LinkConfiguration,
            ResourceKind::Template => Action::Update,
        };
        require(resource_id, &abilities, action)?;
        Ok(self.store.update_link(resource_id, is_public, link).await?)
    }

    /// Deletes a resource and its descendants.
    #[instrument(skip(self, user_id), fields(resource_id = %resource_id))]
    pub async fn delete_resource(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
    ) -> ServiceResult<()> {
        let principal = self.identity.principal(user_id).await;
        let abilities = self.abilities_for(&principal, resource_id).await?;
        require(resource_id, &abilities, Action::Destroy)?;
        self.store.delete_resource(resource_id).await?;
        info!("resource deleted");
        Ok(())
    }

    // Grants

    /// Grants `role` to a user or team.
    pub async fn create_access(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
        subject: Subject,
        role: P::Role,
    ) -> ServiceResult<WriteOutcome<P::Role>> {
        self.write(user_id, resource_id, GrantMutation::Create { subject, role })
            .await
    }

    /// Changes the role of a direct grant.
    pub async fn update_access(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
        grant_id: &str,
        role: P::Role,
    ) -> ServiceResult<WriteOutcome<P::Role>> {
        let mutation = GrantMutation::Update {
            grant_id: grant_id.to_string(),
            role,
        };
        self.write(user_id, resource_id, mutation).await
    }

    /// Removes a direct grant.
    pub async fn delete_access(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
        grant_id: &str,
    ) -> ServiceResult<WriteOutcome<P::Role>> {
        let mutation = GrantMutation::Delete {
            grant_id: grant_id.to_string(),
        };
        self.write(user_id, resource_id, mutation).await
    }

    async fn abilities_for(
        &self,
        principal: &Principal,
        resource_id: &str,
    ) -> ServiceResult<AbilityMap> {
        let snapshot = self.store.snapshot(resource_id).await?;
        let abilities = self
            .resolver
            .abilities(principal, &snapshot)
            .map_err(report)?;
        Ok(abilities)
    }

    #[instrument(skip(self, user_id, mutation), fields(resource_id = %resource_id, op = mutation.op_name()))]
    async fn write(
        &self,
        user_id: Option<&str>,
        resource_id: &str,
        mutation: GrantMutation<P::Role>,
    ) -> ServiceResult<WriteOutcome<P::Role>> {
        let principal = self.identity.principal(user_id).await;

        for attempt in 1..=self.max_write_attempts {
            let snapshot = self.store.snapshot(resource_id).await?;
            self.resolver
                .check_mutation_allowed(&principal, &snapshot, &mutation)
                .map_err(report)?;

            match self
                .store
                .write_grant(resource_id, snapshot.version, mutation.clone())
                .await
            {
                Ok(outcome) => {
                    info!(version = outcome.version, "grant mutation applied");
                    return Ok(outcome);
                }
                Err(err) if err.is_retryable() => {
                    debug!(attempt, error = %err, "grant write conflicted, re-checking");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(
            attempts = self.max_write_attempts,
            "grant write abandoned after repeated conflicts"
        );
        Err(ServiceError::WriteContention {
            resource_id: resource_id.to_string(),
            attempts: self.max_write_attempts,
        })
    }
}

fn require(resource_id: &str, abilities: &AbilityMap, action: Action) -> ServiceResult<()> {
    if abilities.allows(action) {
        Ok(())
    } else {
        Err(ServiceError::ActionDenied {
            resource_id: resource_id.to_string(),
            action,
        })
    }
}

/// Integrity errors mean corrupt stored data; surface them loudly.
fn report(err: DomainError) -> ServiceError {
    if err.is_integrity_error() {
        warn!(error = %err, "integrity error while resolving access");
    }
    ServiceError::Domain(err)
}
