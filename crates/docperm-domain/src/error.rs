//! Domain error types for access resolution.

use thiserror::Error;

/// Domain-specific errors for access resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A grant names both a user and a team, or neither.
    #[error("invalid grant {grant_id}: exactly one of user or team must be set")]
    InvalidGrant { grant_id: String },

    /// A link policy hands out a role the lattice does not allow for links.
    #[error("invalid link role '{role}' on resource {resource_id}")]
    InvalidLinkRole { resource_id: String, role: String },

    /// The snapshot belongs to another kind of resource than the policy.
    #[error("resource {resource_id} is a {actual}, expected a {expected}")]
    ResourceKindMismatch {
        resource_id: String,
        expected: String,
        actual: String,
    },

    /// Ancestor chain is longer than the configured limit.
    #[error("depth limit exceeded (max: {max_depth})")]
    DepthLimitExceeded { max_depth: u32 },

    /// The mutation would leave the resource without an owner.
    #[error("cannot remove the last owner of resource {resource_id}")]
    LastOwner { resource_id: String },

    /// The principal's role does not authorize the mutation.
    #[error("insufficient role on resource {resource_id} (requires: {required})")]
    InsufficientRole {
        resource_id: String,
        required: String,
    },

    /// The targeted grant is not a direct grant of the resource.
    #[error("grant {grant_id} not found on resource {resource_id}")]
    GrantNotFound {
        resource_id: String,
        grant_id: String,
    },
}

impl DomainError {
    /// Returns true for errors caused by corrupt input data.
    ///
    /// These are never expected in normal operation and should be surfaced
    /// as internal errors rather than user-facing rejections.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidGrant { .. }
                | DomainError::InvalidLinkRole { .. }
                | DomainError::ResourceKindMismatch { .. }
                | DomainError::DepthLimitExceeded { .. }
        )
    }

    /// Returns true when the error is a rejected (but well-formed) operation.
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            DomainError::LastOwner { .. } | DomainError::InsufficientRole { .. }
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
