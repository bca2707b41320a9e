//! The access resolver engine.

use tracing::{debug, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{AccessGrant, LinkReach, Principal, ResourceSnapshot, Role};

use super::abilities::{AbilityContext, AbilityMap, GrantAbilities};
use super::config::ResolverConfig;
use super::policy::AccessPolicy;
use super::types::{GrantMutation, Resolution};

/// Resolves roles, abilities and mutation checks for one resource kind.
///
/// Stateless apart from its configuration; a single instance can be shared
/// across threads and requests.
#[derive(Debug, Clone, Default)]
pub struct AccessResolver<P> {
    policy: P,
    config: ResolverConfig,
}

impl<P: AccessPolicy> AccessResolver<P> {
    /// Creates a new resolver for `policy`.
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            config: ResolverConfig::default(),
        }
    }

    /// Creates a new resolver with custom configuration.
    pub fn with_config(policy: P, config: ResolverConfig) -> Self {
        Self { policy, config }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Computes the principal's effective role on the resource.
    ///
    /// `None` is the valid "no access" result, not an error.
    pub fn resolve_role(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot<P::Role>,
    ) -> DomainResult<Option<P::Role>> {
        Ok(self.resolve(principal, snapshot)?.role)
    }

    /// Resolves the principal's access role, link role and effective role.
    pub fn resolve(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot<P::Role>,
    ) -> DomainResult<Resolution<P::Role>> {
        self.validate_snapshot(snapshot)?;

        // Every grant is validated, even for anonymous principals.
        let mut access_role = None;
        for grant in snapshot.grants_in_scope() {
            if grant.subject()?.matches(principal) {
                access_role = access_role.max(Some(grant.role));
            }
        }

        let link_role = snapshot.link.and_then(|link| match link.reach {
            LinkReach::Public => Some(link.role),
            LinkReach::Authenticated if principal.is_authenticated() => Some(link.role),
            LinkReach::Authenticated | LinkReach::Restricted => None,
        });

        let resolution = Resolution::new(access_role, link_role);
        debug!(
            resource_id = %snapshot.id,
            access_role = ?resolution.access_role,
            link_role = ?resolution.link_role,
            role = ?resolution.role,
            "resolved effective role"
        );
        Ok(resolution)
    }

    /// Derives the ability map for a resolved role.
    pub fn compute_abilities(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot<P::Role>,
        resolution: &Resolution<P::Role>,
    ) -> AbilityMap {
        self.policy
            .abilities(&AbilityContext::new(principal, snapshot, resolution))
    }

    /// Resolves the role and derives the ability map in one call.
    pub fn abilities(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot<P::Role>,
    ) -> DomainResult<AbilityMap> {
        let resolution = self.resolve(principal, snapshot)?;
        Ok(self.compute_abilities(principal, snapshot, &resolution))
    }

    /// Abilities of the principal on one grant row of the resource.
    ///
    /// Owner rows can only be changed by an owner, and only while another
    /// direct owner remains. The target's current role is never offered in
    /// `set_role_to`.
    pub fn grant_abilities(
        &self,
        snapshot: &ResourceSnapshot<P::Role>,
        resolution: &Resolution<P::Role>,
        target: &AccessGrant<P::Role>,
    ) -> GrantAbilities<P::Role> {
        let all_descending = P::Role::ALL.iter().rev().copied();

        let (destroy, mut set_role_to) = if target.is_owner() {
            let can_remove = resolution.is_owner() && snapshot.direct_owner_count() > 1;
            let roles: Vec<P::Role> = if can_remove {
                all_descending.filter(|role| !role.is_owner()).collect()
            } else {
                Vec::new()
            };
            (can_remove, roles)
        } else {
            let mut roles = Vec::new();
            if resolution.is_owner() {
                roles.push(P::Role::OWNER);
            }
            if resolution.can_manage() {
                roles.extend(all_descending.filter(|role| *role <= P::Role::ADMINISTRATOR));
            }
            (resolution.can_manage(), roles)
        };
        set_role_to.retain(|role| *role != target.role);

        let can_change = !set_role_to.is_empty();
        GrantAbilities {
            destroy,
            update: can_change,
            partial_update: can_change,
            retrieve: resolution.role.is_some(),
            set_role_to,
        }
    }

    /// Decides whether `mutation` may be applied to the resource's grants.
    ///
    /// The snapshot must be the one the write will be checked against;
    /// the store is responsible for making the check and the write atomic.
    pub fn check_mutation_allowed(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot<P::Role>,
        mutation: &GrantMutation<P::Role>,
    ) -> DomainResult<()> {
        let result = self.evaluate_mutation(principal, snapshot, mutation);
        if let Err(err) = &result {
            warn!(
                resource_id = %snapshot.id,
                op = mutation.op_name(),
                error = %err,
                "grant mutation rejected"
            );
        }
        result
    }

    fn evaluate_mutation(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot<P::Role>,
        mutation: &GrantMutation<P::Role>,
    ) -> DomainResult<()> {
        let resolution = self.resolve(principal, snapshot)?;

        let target = match mutation.grant_id() {
            Some(grant_id) => Some(snapshot.find_grant(grant_id).ok_or_else(|| {
                DomainError::GrantNotFound {
                    resource_id: snapshot.id.clone(),
                    grant_id: grant_id.to_string(),
                }
            })?),
            None => None,
        };
        let target_is_owner = target.is_some_and(|grant| grant.is_owner());
        let writes_owner = mutation.new_role().is_some_and(|role| role.is_owner());

        let acting_role = resolution
            .role
            .filter(|role| role.can_manage())
            .ok_or_else(|| insufficient(snapshot, P::Role::ADMINISTRATOR))?;

        if (target_is_owner || writes_owner) && !acting_role.is_owner() {
            return Err(insufficient(snapshot, P::Role::OWNER));
        }

        let removes_owner = target_is_owner && !writes_owner;
        if removes_owner && snapshot.direct_owner_count() <= 1 {
            return Err(DomainError::LastOwner {
                resource_id: snapshot.id.clone(),
            });
        }

        Ok(())
    }

    fn validate_snapshot(&self, snapshot: &ResourceSnapshot<P::Role>) -> DomainResult<()> {
        let expected = self.policy.kind();
        if snapshot.kind != expected {
            return Err(DomainError::ResourceKindMismatch {
                resource_id: snapshot.id.clone(),
                expected: expected.to_string(),
                actual: snapshot.kind.to_string(),
            });
        }

        if snapshot.ancestors.len() > self.config.max_depth as usize {
            return Err(DomainError::DepthLimitExceeded {
                max_depth: self.config.max_depth,
            });
        }

        if let Some(link) = snapshot.link {
            if !link.role.is_link_role() {
                return Err(DomainError::InvalidLinkRole {
                    resource_id: snapshot.id.clone(),
                    role: link.role.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn insufficient<R: Role>(snapshot: &ResourceSnapshot<R>, required: R) -> DomainError {
    DomainError::InsufficientRole {
        resource_id: snapshot.id.clone(),
        required: required.to_string(),
    }
}
