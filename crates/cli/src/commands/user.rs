//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Register a user (password must already be hashed)
//! user-registry user create -u jdoe -f Jane -l Doe -e jane@example.com -p '$2b$...' -a 34
//!
//! # Show, mark as active, or remove a user
//! user-registry user show -e jane@example.com
//! user-registry user touch -e jane@example.com
//! user-registry user delete -e jane@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `USER_REGISTRY_DATABASE_URL` - `PostgreSQL` connection string

use chrono::Utc;
use serde_json::{Value, json};

use user_registry_core::{CartId, Email, Role, UserRecord};
use user_registry_store::{PgUserStore, UserStore};

use crate::error::CliError;

/// Fields for a new user, as given on the command line.
#[derive(Debug)]
pub struct CreateArgs {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub age: i64,
    pub role: Option<Role>,
    pub cart: Option<CartId>,
}

impl CreateArgs {
    /// The candidate document submitted to the store.
    fn to_candidate(&self) -> Value {
        let mut candidate = json!({
            "username": self.username,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "email": self.email,
            "password": self.password,
            "age": self.age,
        });
        if let Some(role) = self.role {
            candidate["role"] = Value::from(role.as_str());
        }
        if let Some(cart) = self.cart {
            candidate["cart"] = Value::from(cart.to_string());
        }
        candidate
    }
}

/// Register a new user.
///
/// # Errors
///
/// Returns an error if the fields break the schema, the email is taken, or
/// the database is unreachable.
pub async fn create(args: &CreateArgs) -> Result<(), CliError> {
    let store = super::connect().await?;

    tracing::info!("Creating user: {}", args.email);
    let record = store.insert(&args.to_candidate()).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        record.id,
        record.email,
        record.role
    );
    Ok(())
}

/// Print a user record (password redacted).
///
/// # Errors
///
/// Returns `CliError::UserNotFound` if no user holds the email.
pub async fn show(email: &str) -> Result<(), CliError> {
    let store = super::connect().await?;
    let record = find(&store, email).await?;
    super::print_document(redacted(&record))
}

/// Set a user's `last_connection` to now.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` if no user holds the email.
pub async fn touch(email: &str) -> Result<(), CliError> {
    let store = super::connect().await?;
    let record = find(&store, email).await?;

    let now = Utc::now();
    store
        .update(record.id, &json!({ "last_connection": now.to_rfc3339() }))
        .await?;

    tracing::info!("Last connection of {} set to {}", record.email, now);
    Ok(())
}

/// Delete a user and everything embedded in it. The cart is left alone.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` if no user holds the email.
pub async fn delete(email: &str) -> Result<(), CliError> {
    let store = super::connect().await?;
    let record = find(&store, email).await?;

    if store.delete(record.id).await? {
        tracing::info!("Deleted user {} ({})", record.id, record.email);
    } else {
        tracing::warn!("User {} was removed concurrently", record.id);
    }
    Ok(())
}

async fn find(store: &PgUserStore, email: &str) -> Result<UserRecord, CliError> {
    let email = Email::parse(email)?;
    store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.into_inner()))
}

fn redacted(record: &UserRecord) -> serde_json::Map<String, Value> {
    let mut doc = record.to_document();
    doc.insert("password".to_owned(), Value::from("[REDACTED]"));
    doc
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use user_registry_core::{NewUser, UserId};

    use super::*;

    fn args() -> CreateArgs {
        CreateArgs {
            username: "jdoe".to_owned(),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            email: "jane@example.com".to_owned(),
            password: "hash".to_owned(),
            age: 34,
            role: None,
            cart: None,
        }
    }

    #[test]
    fn test_candidate_omits_unset_options() {
        let candidate = args().to_candidate();
        assert!(candidate.get("role").is_none());
        assert!(candidate.get("cart").is_none());
        assert!(NewUser::from_document(&candidate, Utc::now()).is_ok());
    }

    #[test]
    fn test_candidate_carries_role_and_cart() {
        let cart = CartId::generate();
        let candidate = CreateArgs {
            role: Some(Role::Premium),
            cart: Some(cart),
            ..args()
        }
        .to_candidate();
        let user = NewUser::from_document(&candidate, Utc::now()).unwrap();
        assert_eq!(user.role, Role::Premium);
        assert_eq!(user.cart, Some(cart));
    }

    #[test]
    fn test_redacted_hides_password() {
        let record = NewUser::from_document(&args().to_candidate(), Utc::now())
            .unwrap()
            .into_record(UserId::generate());
        let doc = redacted(&record);
        assert_eq!(doc["password"], "[REDACTED]");
        assert_eq!(doc["email"], "jane@example.com");
    }
}
