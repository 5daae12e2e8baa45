// ============================
// crates/auth-lib/src/storage/memory.rs
// ============================
//! In-process user store backed by a `DashMap`.
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{normalize_email, NewUser, StoredUser, UserStore, UserUpdate};
use crate::error::StoreError;

/// Volatile store, used by tests and the CLI when no data directory is set
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<Uuid, StoredUser>>,
    /// Serializes inserts so the email uniqueness check cannot race
    create_lock: Arc<Mutex<()>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create_user(&self, input: NewUser) -> Result<StoredUser, StoreError> {
        let _guard = self.create_lock.lock().await;

        let email = normalize_email(&input.email);
        if self.users.iter().any(|entry| entry.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let user = StoredUser::from_new(Uuid::new_v4(), input);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<StoredUser, StoreError> {
        let mut entry = self.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        entry.apply(update);
        Ok(entry.clone())
    }

    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        hash: Option<String>,
    ) -> Result<(), StoreError> {
        if let Some(mut entry) = self.users.get_mut(&id) {
            entry.refresh_token_hash = hash;
        }
        Ok(())
    }
}
