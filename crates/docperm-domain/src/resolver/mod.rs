//! Access resolver for documents and templates.
//!
//! The resolver is a pure function family over a [`ResourceSnapshot`]:
//! it computes the caller's effective role, the ability map derived from
//! it, and whether an access-management mutation is allowed.
//!
//! [`ResourceSnapshot`]: crate::model::ResourceSnapshot
//!
//! # Architecture Decisions
//!
//! - **Pre-fetched snapshots**: The caller fetches the resource, its
//!   ancestor chain and every relevant grant in one batched read. The
//!   resolver never queries, so a resolution costs O(1) store round trips.
//!
//! - **One engine, two lattices**: [`AccessResolver`] is generic over an
//!   [`AccessPolicy`]. Documents and templates differ only in their role
//!   lattice and action set.
//!
//! - **Inheritance by maximum**: Grants anywhere up the document tree flow
//!   down at the same role. Depth never diminishes access, so ancestor
//!   order only matters for deterministic iteration.
//!
//! - **Direct ownership**: Inherited ownership lets a principal act as an
//!   owner, but only owner grants held directly on the resource count
//!   towards the last-owner guard.

mod abilities;
mod access_resolver;
mod config;
mod policy;
mod types;

#[cfg(test)]
mod tests;

pub use abilities::{AbilityContext, AbilityMap, Action, GrantAbilities};
pub use access_resolver::AccessResolver;
pub use config::ResolverConfig;
pub use policy::{AccessPolicy, DocumentPolicy, TemplatePolicy};
pub use types::{GrantMutation, Resolution};
