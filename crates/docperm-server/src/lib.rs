//! docperm-server: Service layer for the access resolver
//!
//! This crate wires the resolver to its collaborators:
//! - Configuration management (YAML file + `DOCPERM_` environment)
//! - Logging setup
//! - Identity provider (principal and team memberships)
//! - Access service (identity -> snapshot -> resolver -> guarded write)
//! - JSON fixtures for the `docperm` CLI
//!
//! # Request Flow
//!
//! ```text
//! caller ──► AccessService ──► IdentityProvider   (once per request)
//!                 │
//!                 ├──────────► AccessStore::snapshot (once per attempt)
//!                 ├──────────► AccessResolver       (pure)
//!                 └──────────► AccessStore::write_grant(version)
//!                                   │
//!                                   └─ VersionConflict ─► re-read, re-check
//! ```

pub mod config;
pub mod fixture;
pub mod identity;
pub mod observability;
pub mod service;

pub use config::{AppConfig, ConfigLoadError};
pub use fixture::{Fixture, FixtureError, LoadedFixture};
pub use identity::{IdentityProvider, StaticIdentityProvider};
pub use observability::{init_logging, LoggingConfig};
pub use service::{AccessService, ErrorKind, GrantView, ServiceError, ServiceResult};
