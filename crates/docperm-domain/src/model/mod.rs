//! Access model types.
//!
//! This module contains:
//! - Role lattices (document and template)
//! - Principals supplied by the identity collaborator
//! - Access grants and resource snapshots supplied by the store

mod grant;
mod principal;
mod resource;
mod role;
#[cfg(test)]
mod types_proptest;

pub use grant::{AccessGrant, Subject, SubjectRef};
pub use principal::Principal;
pub use resource::{AncestorSnapshot, LinkPolicy, LinkReach, ResourceKind, ResourceSnapshot};
pub use role::{DocumentRole, ParseRoleError, Role, TemplateRole};
