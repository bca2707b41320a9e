//! docperm-storage: Storage abstraction layer
//!
//! This crate provides the Resource Store collaborator of the access
//! resolver:
//! - AccessStore trait for resources, hierarchy and grants
//! - In-memory implementation for tests and local use
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              docperm-storage                 │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - AccessStore trait definition │
//! │  memory.rs   - In-memory implementation     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Consistency
//!
//! Every resource carries a grant-set version. Grant writes name the version
//! their authorization check was made against and fail with
//! [`StorageError::VersionConflict`] if it moved, which makes the
//! read-check-write sequence of the last-owner rule serializable.

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryAccessStore;
pub use traits::{AccessStore, NewResource, ResourceRecord, WriteOutcome};
