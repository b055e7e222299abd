//! Storage for user records.
//!
//! Every backend runs candidate documents through the schema in
//! `user-registry-core` before writing, and enforces email uniqueness at a
//! single serialization point of its own:
//!
//! - [`InMemoryUserStore`] - one write lock guards both the records and the
//!   email index, so the uniqueness check and the write are atomic
//! - [`PgUserStore`] - the `user_account_email_key` unique constraint
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p user-registry-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod memory;
pub mod postgres;

use std::future::Future;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;
use thiserror::Error;

use user_registry_core::{Email, UniquenessError, UserId, UserRecord, ValidationError};

pub use memory::InMemoryUserStore;
pub use postgres::{PgUserStore, create_pool, migrate};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The candidate or patched record breaks the schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another record already holds the email.
    #[error(transparent)]
    Uniqueness(#[from] UniquenessError),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations could not be applied.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// The persistence contract for user records.
///
/// Writes either fully succeed or leave the store untouched.
pub trait UserStore: Send + Sync {
    /// Validate, default and insert a candidate document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the candidate does not conform,
    /// `StoreError::Uniqueness` if its email is taken.
    fn insert(
        &self,
        candidate: &Value,
    ) -> impl Future<Output = Result<UserRecord, StoreError>> + Send;

    /// Apply a partial update to an existing record.
    ///
    /// See [`UserRecord::patched`] for the patch semantics.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has this id,
    /// `StoreError::Validation` if the result does not conform,
    /// `StoreError::Uniqueness` if the new email belongs to another record.
    fn update(
        &self,
        id: UserId,
        patch: &Value,
    ) -> impl Future<Output = Result<UserRecord, StoreError>> + Send;

    /// Look a record up by its exact email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the backend fails.
    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Look a record up by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the backend fails.
    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Delete a record together with its embedded documents and reset token.
    ///
    /// Returns `true` if the record existed. The referenced cart is untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the backend fails.
    fn delete(&self, id: UserId) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Write timestamp, at the precision `PostgreSQL` keeps.
pub(crate) fn write_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
