//! docperm-domain: Core access resolution logic
//!
//! This crate contains the pure authorization logic for documents and
//! templates:
//! - Role lattices and the data model (principals, grants, snapshots)
//! - Effective role resolution over a document's ancestor chain
//! - Ability maps consumed by API endpoints
//! - Mutation checks guarding access management (last-owner rule)
//!
//! Nothing in this crate performs I/O. Callers fetch a [`ResourceSnapshot`]
//! in one batched read and hand it to the resolver.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               docperm-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  model/     - Roles, principals, grants     │
//! │  resolver/  - Roles, abilities, mutations   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
pub use model::{
    AccessGrant, AncestorSnapshot, DocumentRole, LinkPolicy, LinkReach, Principal, ResourceKind,
    ResourceSnapshot, Role, Subject, TemplateRole,
};
pub use resolver::{
    AbilityMap, AccessPolicy, AccessResolver, Action, DocumentPolicy, GrantAbilities,
    GrantMutation, Resolution, ResolverConfig, TemplatePolicy,
};
