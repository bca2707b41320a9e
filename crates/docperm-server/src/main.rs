//! docperm CLI
//!
//! Resolves abilities against a JSON fixture.
//!
//! # Usage
//!
//! ```bash
//! # Ability map of bob on a document
//! docperm --config docperm.yaml abilities --fixture fixture.json --resource doc-1 --user bob
//!
//! # Anonymous caller, configuration from DOCPERM_* environment variables
//! docperm abilities --fixture fixture.json --resource doc-1
//!
//! # Validate configuration and exit
//! docperm --config docperm.yaml check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use docperm_domain::{DocumentPolicy, TemplatePolicy};
use docperm_server::observability::{init_logging, LoggingConfig};
use docperm_server::{AccessService, AppConfig, Fixture, IdentityProvider};
use docperm_storage::AccessStore;

/// docperm - role and ability resolution for documents and templates
#[derive(Parser, Debug)]
#[command(name = "docperm")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the caller's ability map on a resource as JSON
    Abilities {
        #[command(flatten)]
        target: Target,
    },
    /// Print the resource's direct grants with the caller's abilities on each
    Accesses {
        #[command(flatten)]
        target: Target,
    },
    /// Validate the configuration and exit
    Check,
}

#[derive(clap::Args, Debug)]
struct Target {
    /// JSON fixture to seed the in-memory store with
    #[arg(long)]
    fixture: PathBuf,

    /// Document or template id
    #[arg(long)]
    resource: String,

    /// Calling user; anonymous when omitted
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env()?,
    };

    init_logging(LoggingConfig::from(&config.logging));
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %config.storage.backend,
        "docperm starting"
    );

    match args.command {
        Command::Check => {
            println!("configuration ok");
            Ok(())
        }
        Command::Abilities { target } => {
            let output = run(&config, &target, Query::Abilities).await?;
            println!("{output}");
            Ok(())
        }
        Command::Accesses { target } => {
            let output = run(&config, &target, Query::Accesses).await?;
            println!("{output}");
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Query {
    Abilities,
    Accesses,
}

/// Looks the resource up among documents first, then templates.
async fn run(config: &AppConfig, target: &Target, query: Query) -> anyhow::Result<String> {
    let fixture = Fixture::from_path(&target.fixture)?;
    let loaded = fixture.load(&config.access).await?;
    let identity: Arc<dyn IdentityProvider> = loaded.identity;
    let user = target.user.as_deref();

    if loaded.documents.get_resource(&target.resource).await.is_ok() {
        let service = AccessService::from_settings(
            loaded.documents,
            identity,
            DocumentPolicy,
            &config.access,
        );
        return match query {
            Query::Abilities => to_json(&service.abilities(user, &target.resource).await?),
            Query::Accesses => to_json(&service.grant_abilities(user, &target.resource).await?),
        };
    }

    let service =
        AccessService::from_settings(loaded.templates, identity, TemplatePolicy, &config.access);
    match query {
        Query::Abilities => to_json(&service.abilities(user, &target.resource).await?),
        Query::Accesses => to_json(&service.grant_abilities(user, &target.resource).await?),
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode output")
}
