//! Subcommand implementations.

pub mod migrate;
pub mod user;
pub mod validate;

use std::io::Write;

use serde_json::{Map, Value};

use user_registry_store::{PgUserStore, StoreError, create_pool};

use crate::config::RegistryConfig;
use crate::error::CliError;

/// Open a `PostgreSQL` store from environment configuration.
async fn connect() -> Result<PgUserStore, CliError> {
    let config = RegistryConfig::from_env()?;

    tracing::info!("Connecting to user registry database...");
    let pool = create_pool(&config.database_url, config.max_connections)
        .await
        .map_err(StoreError::from)?;

    Ok(PgUserStore::new(pool))
}

/// Write a document to stdout as pretty JSON.
fn print_document(doc: Map<String, Value>) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(&Value::Object(doc))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
