//! Integration tests for the user registry.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory store only
//! cargo test -p user-registry-integration-tests
//!
//! # Also exercise PostgreSQL (migrations are applied automatically)
//! USER_REGISTRY_TEST_DATABASE_URL=postgres://localhost/user_registry_test \
//!     cargo test -p user-registry-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `user_contract` - Schema and store behavior against the in-memory store
//! - `postgres_store` - The same contract against `PostgreSQL`

use serde_json::{Value, json};
use sqlx::PgPool;

use user_registry_store::{PgUserStore, create_pool, migrate};

/// Environment variable naming the throwaway test database.
pub const TEST_DATABASE_URL: &str = "USER_REGISTRY_TEST_DATABASE_URL";

/// A complete candidate with only the required fields.
#[must_use]
pub fn candidate(email: &str) -> Value {
    json!({
        "username": "jdoe",
        "first_name": "Jane",
        "last_name": "Doe",
        "email": email,
        "password": "$2b$10$abcdefghijklmnopqrstuv",
        "age": 34
    })
}

/// An email no other test run will use.
#[must_use]
pub fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", user_registry_core::UserId::generate())
}

/// Connect to the test database and migrate it, or `None` when unconfigured.
///
/// # Panics
///
/// Panics if the variable is set but the database is unusable.
#[allow(clippy::expect_used)]
pub async fn postgres_store() -> Option<PgUserStore> {
    let _ = dotenvy::dotenv();
    let url = std::env::var(TEST_DATABASE_URL).ok()?;

    let pool: PgPool = create_pool(&secrecy::SecretString::from(url), 5)
        .await
        .expect("test database should be reachable");
    migrate(&pool).await.expect("migrations should apply");
    Some(PgUserStore::new(pool))
}
