//! Storage error types.

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Resource not found.
    #[error("resource not found: {resource_id}")]
    ResourceNotFound { resource_id: String },

    /// Resource already exists.
    #[error("resource already exists: {resource_id}")]
    ResourceAlreadyExists { resource_id: String },

    /// Parent document not found.
    #[error("parent not found: {parent_id}")]
    ParentNotFound { parent_id: String },

    /// The requested parent/child relation is not allowed.
    #[error("invalid hierarchy: {message}")]
    InvalidHierarchy { message: String },

    /// Grant not found on the resource.
    #[error("grant {grant_id} not found on resource {resource_id}")]
    GrantNotFound {
        resource_id: String,
        grant_id: String,
    },

    /// The subject already holds a grant on the resource.
    #[error("{subject} already has access to resource {resource_id}")]
    DuplicateGrant {
        resource_id: String,
        subject: String,
    },

    /// The grant set changed since the snapshot the write was checked against.
    #[error("grants of resource {resource_id} changed (expected version {expected}, found {actual})")]
    VersionConflict {
        resource_id: String,
        expected: u64,
        actual: u64,
    },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl StorageError {
    /// Returns true if re-reading and retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::VersionConflict { .. })
    }

    /// Returns true if the error means a referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ResourceNotFound { .. }
                | StorageError::ParentNotFound { .. }
                | StorageError::GrantNotFound { .. }
        )
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
