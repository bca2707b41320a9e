//! Tests for the access resolver module.
//!
//! Organized by functionality:
//! - Role resolution (direct, team, inherited, link-derived)
//! - Ability maps for documents and templates
//! - Grant abilities and mutation checks (last-owner rule)
//! - Property-based invariants


#[cfg(test)]
mod mutation_tests;
#[cfg(test)]
mod property_tests;
