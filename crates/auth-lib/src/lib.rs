// ============================
// crates/auth-lib/src/lib.rs
// ============================
//! Credential and session core for `tokenwarden`.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

use std::sync::Arc;

use crate::auth::{select_hasher, AuthService, LoginRateLimiter, SessionManager, TokenIssuer};
use crate::config::Settings;
use crate::error::AuthError;
use crate::storage::{FlatFileUserStore, MemoryUserStore, UserStore};

/// Everything the boundary layer shares across requests
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session manager, for callers that need the concrete type
    pub sessions: Arc<SessionManager>,
    /// Login rate limiter
    pub rate_limiter: Arc<LoginRateLimiter>,
    /// User store
    pub store: Arc<dyn UserStore>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the core together over an existing store
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Result<Self, AuthError> {
        let tokens = TokenIssuer::from_settings(&settings)?;
        let rate_limiter = Arc::new(LoginRateLimiter::from_settings(&settings.rate_limit));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&store),
            select_hasher(),
            tokens,
            Arc::clone(&rate_limiter),
            &settings,
        ));

        Ok(Self {
            auth: sessions.clone(),
            sessions,
            rate_limiter,
            store,
            settings: Arc::new(settings),
        })
    }

    /// Build the store named by `settings.data_dir`, in memory when unset
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match &settings.data_dir {
            Some(dir) => {
                tracing::info!(path = %dir.display(), "using flat-file user store");
                Arc::new(FlatFileUserStore::new(dir)?)
            }
            None => {
                tracing::info!("using in-memory user store");
                Arc::new(MemoryUserStore::new())
            }
        };
        Ok(Self::new(store, settings)?)
    }
}
