//! `PostgreSQL` user store.
//!
//! # Table: `user_registry.user_account`
//!
//! One row per user. `documents` and `reset_token` are JSONB columns on the
//! row, `cart_id` is a plain UUID without a foreign key, and there is no
//! version column. Email uniqueness is the `user_account_email_key`
//! constraint, so concurrent writers race on the index, not in Rust.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use user_registry_core::{
    CartId, DocumentSubRecord, Email, NewUser, Password, ResetToken, Role, UniquenessError,
    UserId, UserRecord,
};

use crate::{StoreError, UserStore, write_time};

const EMAIL_CONSTRAINT: &str = "user_account_email_key";

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply the embedded migrations.
///
/// # Errors
///
/// Returns `StoreError::Migration` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    first_name: String,
    last_name: String,
    email: Email,
    password: String,
    age: i64,
    role: String,
    cart_id: Option<CartId>,
    documents: Json<Vec<DocumentSubRecord>>,
    reset_token: Option<Json<ResetToken>>,
    last_connection: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("{e} in database")))?;

        Ok(Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password: Password::new(row.password),
            age: row.age,
            role,
            cart: row.cart_id,
            documents: row.documents.0,
            reset_token: row.reset_token.map(|Json(token)| token),
            last_connection: row.last_connection,
        })
    }
}

/// Map a write failure, turning the email constraint into a `UniquenessError`.
fn write_error(e: sqlx::Error, email: &Email) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
        && db_err.constraint() == Some(EMAIL_CONSTRAINT)
    {
        return UniquenessError {
            email: email.clone(),
        }
        .into();
    }
    StoreError::Database(e)
}

/// User store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl UserStore for PgUserStore {
    #[tracing::instrument(skip_all)]
    async fn insert(&self, candidate: &Value) -> Result<UserRecord, StoreError> {
        let record = NewUser::from_document(candidate, write_time())?.into_record(UserId::generate());

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO user_registry.user_account
                (id, username, first_name, last_name, email, password, age,
                 role, cart_id, documents, reset_token, last_connection)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, username, first_name, last_name, email, password, age,
                      role, cart_id, documents, reset_token, last_connection
            ",
        )
        .bind(record.id)
        .bind(&record.username)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(record.password.expose())
        .bind(record.age)
        .bind(record.role.as_str())
        .bind(record.cart)
        .bind(Json(&record.documents))
        .bind(record.reset_token.as_ref().map(Json))
        .bind(record.last_connection)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, &record.email))?;

        let stored = UserRecord::try_from(row)?;
        tracing::info!(user_id = %stored.id, "user created");
        Ok(stored)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&self, id: UserId, patch: &Value) -> Result<UserRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, first_name, last_name, email, password, age,
                   role, cart_id, documents, reset_token, last_connection
            FROM user_registry.user_account
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = UserRecord::try_from(row.ok_or(StoreError::NotFound)?)?;
        let updated = current.patched(patch, write_time())?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE user_registry.user_account
            SET username = $2, first_name = $3, last_name = $4, email = $5,
                password = $6, age = $7, role = $8, cart_id = $9,
                documents = $10, reset_token = $11, last_connection = $12
            WHERE id = $1
            RETURNING id, username, first_name, last_name, email, password, age,
                      role, cart_id, documents, reset_token, last_connection
            ",
        )
        .bind(updated.id)
        .bind(&updated.username)
        .bind(&updated.first_name)
        .bind(&updated.last_name)
        .bind(&updated.email)
        .bind(updated.password.expose())
        .bind(updated.age)
        .bind(updated.role.as_str())
        .bind(updated.cart)
        .bind(Json(&updated.documents))
        .bind(updated.reset_token.as_ref().map(Json))
        .bind(updated.last_connection)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, &updated.email))?;

        tx.commit().await?;

        let stored = UserRecord::try_from(row)?;
        tracing::info!("user updated");
        Ok(stored)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, first_name, last_name, email, password, age,
                   role, cart_id, documents, reset_token, last_connection
            FROM user_registry.user_account
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(UserRecord::try_from)
        .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, first_name, last_name, email, password, age,
                   role, cart_id, documents, reset_token, last_connection
            FROM user_registry.user_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(UserRecord::try_from)
        .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM user_registry.user_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("user deleted");
        }
        Ok(deleted)
    }
}
