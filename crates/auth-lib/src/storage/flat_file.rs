// ============================
// crates/auth-lib/src/storage/flat_file.rs
// ============================
//! Flat-file user store: one pretty-printed JSON document per user.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use async_trait::async_trait;
use tokio::{fs as tokio_fs, sync::Mutex};
use uuid::Uuid;

use super::{normalize_email, NewUser, StoredUser, UserStore, UserUpdate};
use crate::error::StoreError;

/// Flat-file implementation of the `UserStore` trait
#[derive(Debug, Clone)]
pub struct FlatFileUserStore {
    root: PathBuf,
    /// Every mutation goes through this lock; reads do not
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileUserStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users"))?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn user_path(&self, id: Uuid) -> PathBuf {
        self.root.join("users").join(format!("{id}.json"))
    }

    async fn read_user(&self, path: &Path) -> Result<Option<StoredUser>, StoreError> {
        if !tokio_fs::try_exists(path).await? {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write via a temp file and rename so readers never see a torn record
    async fn write_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        let path = self.user_path(user.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(user)?;
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<StoredUser>, StoreError> {
        let mut users = Vec::new();
        let mut dir = tokio_fs::read_dir(self.root.join("users")).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(user) = self.read_user(&path).await? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self.scan().await?.into_iter().find(|user| user.email == email))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, StoreError> {
        self.read_user(&self.user_path(id)).await
    }

    async fn create_user(&self, input: NewUser) -> Result<StoredUser, StoreError> {
        let _guard = self.write_lock.lock().await;

        let email = normalize_email(&input.email);
        if self.scan().await?.iter().any(|user| user.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let user = StoredUser::from_new(Uuid::new_v4(), input);
        self.write_user(&user).await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<StoredUser, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut user = self
            .read_user(&self.user_path(id))
            .await?
            .ok_or(StoreError::NotFound)?;
        user.apply(update);
        self.write_user(&user).await?;
        Ok(user)
    }

    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        hash: Option<String>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Some(mut user) = self.read_user(&self.user_path(id)).await? {
            user.refresh_token_hash = hash;
            self.write_user(&user).await?;
        }
        Ok(())
    }
}
