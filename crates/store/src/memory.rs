//! In-process user store.
//!
//! Used by tests and by tools that need the full write contract without a
//! database.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

use user_registry_core::{Email, NewUser, UniquenessError, UserId, UserRecord};

use crate::{StoreError, UserStore, write_time};

#[derive(Debug, Default)]
struct Collection {
    records: HashMap<UserId, UserRecord>,
    by_email: HashMap<Email, UserId>,
}

impl Collection {
    /// The id holding `email`, unless it is `except`.
    fn email_holder(&self, email: &Email, except: Option<UserId>) -> Option<UserId> {
        self.by_email
            .get(email)
            .copied()
            .filter(|holder| Some(*holder) != except)
    }
}

/// A user store backed by a hash map.
///
/// The email index and the records sit behind the same lock; a write holds
/// it from the uniqueness check through the final insert.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Collection>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    #[tracing::instrument(skip_all)]
    async fn insert(&self, candidate: &Value) -> Result<UserRecord, StoreError> {
        let new_user = NewUser::from_document(candidate, write_time())?;

        let mut collection = self.inner.write().await;
        if collection.email_holder(&new_user.email, None).is_some() {
            tracing::debug!(email = %new_user.email, "email already taken");
            return Err(UniquenessError {
                email: new_user.email,
            }
            .into());
        }

        let record = new_user.into_record(UserId::generate());
        collection
            .by_email
            .insert(record.email.clone(), record.id);
        collection.records.insert(record.id, record.clone());

        tracing::info!(user_id = %record.id, "user created");
        Ok(record)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&self, id: UserId, patch: &Value) -> Result<UserRecord, StoreError> {
        let mut collection = self.inner.write().await;
        let current = collection.records.get(&id).ok_or(StoreError::NotFound)?;
        let updated = current.patched(patch, write_time())?;

        if updated.email != current.email {
            if collection.email_holder(&updated.email, Some(id)).is_some() {
                return Err(UniquenessError {
                    email: updated.email,
                }
                .into());
            }
            let previous = current.email.clone();
            collection.by_email.remove(&previous);
            collection.by_email.insert(updated.email.clone(), id);
        }
        collection.records.insert(id, updated.clone());

        tracing::info!("user updated");
        Ok(updated)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        let collection = self.inner.read().await;
        Ok(collection
            .by_email
            .get(email)
            .and_then(|id| collection.records.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut collection = self.inner.write().await;
        let Some(record) = collection.records.remove(&id) else {
            return Ok(false);
        };
        collection.by_email.remove(&record.email);

        tracing::info!("user deleted");
        Ok(true)
    }
}
