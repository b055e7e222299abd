//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! user-registry migrate
//! ```
//!
//! # Environment Variables
//!
//! - `USER_REGISTRY_DATABASE_URL` - `PostgreSQL` connection string

use crate::error::CliError;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let store = super::connect().await?;

    tracing::info!("Running user registry migrations...");
    user_registry_store::migrate(store.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
