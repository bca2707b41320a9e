//! JSON fixtures: resources, grants and team memberships to seed the
//! in-memory store with.
//!
//! ```json
//! {
//!   "teams": { "carol": ["design"] },
//!   "documents": [
//!     { "id": "root", "creator": "alice",
//!       "link": { "reach": "public", "role": "reader" },
//!       "grants": [ { "subject": { "team": "design" }, "role": "editor" } ] },
//!     { "id": "child", "parent_id": "root", "creator": "alice" }
//!   ],
//!   "templates": [ { "id": "invoice", "creator": "bob" } ]
//! }
//! ```
//!
//! Documents are created in file order, so parents must precede their
//! children.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use docperm_domain::{DocumentRole, GrantMutation, LinkPolicy, Role, Subject, TemplateRole};
use docperm_storage::{AccessStore, MemoryAccessStore, NewResource, StorageError};

use crate::config::AccessSettings;
use crate::identity::StaticIdentityProvider;

/// Errors raised while reading or applying a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to seed resource {resource_id}: {source}")]
    Storage {
        resource_id: String,
        #[source]
        source: StorageError,
    },
}

/// A fixture resource. The creator becomes its first owner.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "R: Role"))]
pub struct FixtureResource<R> {
    pub id: String,
    pub creator: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "Option::default")]
    pub link: Option<LinkPolicy<R>>,
    #[serde(default = "Vec::new")]
    pub grants: Vec<FixtureGrant<R>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "R: Role"))]
pub struct FixtureGrant<R> {
    pub subject: Subject,
    pub role: R,
}

/// Parsed fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// Team memberships per user id.
    #[serde(default)]
    pub teams: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub documents: Vec<FixtureResource<DocumentRole>>,
    #[serde(default)]
    pub templates: Vec<FixtureResource<TemplateRole>>,
}

/// Stores and identity provider populated from a fixture.
pub struct LoadedFixture {
    pub documents: Arc<MemoryAccessStore<DocumentRole>>,
    pub templates: Arc<MemoryAccessStore<TemplateRole>>,
    pub identity: Arc<StaticIdentityProvider>,
}

impl Fixture {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Seeds fresh in-memory stores with the fixture's content.
    pub async fn load(&self, settings: &AccessSettings) -> Result<LoadedFixture, FixtureError> {
        let identity = StaticIdentityProvider::new();
        for (user_id, teams) in &self.teams {
            for team in teams {
                identity.add_membership(user_id.as_str(), team.as_str());
            }
        }

        let documents = MemoryAccessStore::with_max_depth(settings.max_ancestor_depth);
        for resource in &self.documents {
            let new = NewResource::document(&resource.id);
            seed(&documents, new, resource).await?;
        }

        let templates = MemoryAccessStore::with_max_depth(settings.max_ancestor_depth);
        for resource in &self.templates {
            let new = NewResource::template(&resource.id);
            seed(&templates, new, resource).await?;
        }

        info!(
            documents = self.documents.len(),
            templates = self.templates.len(),
            users_with_teams = self.teams.len(),
            "fixture loaded"
        );
        Ok(LoadedFixture {
            documents: Arc::new(documents),
            templates: Arc::new(templates),
            identity: Arc::new(identity),
        })
    }
}

async fn seed<R, S>(
    store: &S,
    mut new: NewResource<R>,
    resource: &FixtureResource<R>,
) -> Result<(), FixtureError>
where
    R: Role,
    S: AccessStore<R>,
{
    let storage_error = |source| FixtureError::Storage {
        resource_id: resource.id.clone(),
        source,
    };

    new.parent_id = resource.parent_id.clone();
    new.is_public = resource.is_public;
    new.link = resource.link;
    store
        .create_resource(new, &resource.creator)
        .await
        .map_err(storage_error)?;

    let mut version = store
        .snapshot(&resource.id)
        .await
        .map_err(storage_error)?
        .version;
    for grant in &resource.grants {
        let mutation = GrantMutation::Create {
            subject: grant.subject.clone(),
            role: grant.role,
        };
        version = store
            .write_grant(&resource.id, version, mutation)
            .await
            .map_err(storage_error)?
            .version;
    }
    Ok(())
}
