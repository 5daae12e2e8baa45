// ============================
// crates/auth-lib/src/storage/mod.rs
// ============================
//! User-record storage abstraction.
//!
//! The credential core owns no persistence of its own: it reads and writes
//! user records, including the single refresh-token hash, through
//! [`UserStore`]. Two backends ship with the crate.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokenwarden_common::SafeUser;
use uuid::Uuid;

use crate::error::StoreError;

mod flat_file;
mod memory;

pub use flat_file::FlatFileUserStore;
pub use memory::MemoryUserStore;

/// Canonical form used for email lookup and uniqueness
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A persisted user record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Always stored normalized
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    /// `None` while no session is active
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build a fresh record with no active session
    pub fn from_new(id: Uuid, input: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: normalize_email(&input.email),
            password_hash: input.password_hash,
            phone: input.phone,
            bio: input.bio,
            profile_image_url: input.profile_image_url,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Strip both credential hashes
    pub fn to_safe_user(&self) -> SafeUser {
        SafeUser {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            bio: self.bio.clone(),
            profile_image_url: self.profile_image_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Apply a partial profile update in place
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(bio) = update.bio {
            self.bio = bio;
        }
        if let Some(url) = update.profile_image_url {
            self.profile_image_url = url;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields required to create a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Partial profile update.
///
/// The outer `Option` means "leave unchanged"; for nullable columns the inner
/// `Option` carries the new value, `None` clearing it.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub profile_image_url: Option<Option<String>>,
}

/// Trait for user storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by email; the argument is normalized by the store
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Look a user up by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, StoreError>;

    /// Insert a new user; fails with `DuplicateEmail` on a normalized clash
    async fn create_user(&self, input: NewUser) -> Result<StoredUser, StoreError>;

    /// Apply a partial update; fails with `NotFound` for an unknown id
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<StoredUser, StoreError>;

    /// Overwrite the refresh-token hash. Unknown ids are ignored.
    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        hash: Option<String>,
    ) -> Result<(), StoreError>;
}
