// ============================
// crates/auth-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for authentication attempts.
//!
//! Fixed windows per key: the first attempt opens a window, later attempts
//! inside it count up until the threshold, after which they are refused until
//! the window runs out. A guarded request settles its [`AttemptPermit`] once
//! its outcome is known; an outcome matching the limiter's [`ClearPolicy`]
//! drops the key's tracker so a user who eventually succeeds starts clean.
//!
//! Expired trackers are swept from inside `check_and_record`, at most once
//! per window, so keys that never return do not accumulate.
//!
//! State is per process and lost on restart.

use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::RateLimitSettings;
use crate::error::AuthError;
use crate::storage::normalize_email;

/// Default number of attempts per window
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default window length (15 minutes)
const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Key segment used when the request carries no email
const ANONYMOUS: &str = "anonymous";

/// Key segment used when the client origin is unknown
const UNKNOWN_ORIGIN: &str = "unknown";

/// Build the tracker key for a login attempt
pub fn attempt_key(origin: Option<&str>, email: Option<&str>) -> String {
    let origin = origin
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .unwrap_or(UNKNOWN_ORIGIN);
    let email = email
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string());
    format!("{origin}:{email}")
}

/// How a guarded request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Redirected,
    Failed,
}

/// Which outcomes clear a key's tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Only a successful outcome clears
    #[default]
    Success,
    /// Success or redirect clears
    SuccessOrRedirect,
}

impl ClearPolicy {
    pub fn clears(self, outcome: AttemptOutcome) -> bool {
        match (self, outcome) {
            (_, AttemptOutcome::Succeeded) => true,
            (ClearPolicy::SuccessOrRedirect, AttemptOutcome::Redirected) => true,
            _ => false,
        }
    }
}

/// Attempts seen for one key inside the current window
#[derive(Debug, Clone)]
struct AttemptTracker {
    count: u32,
    expires_at: Instant,
}

/// Rate limiter for authentication attempts
#[derive(Debug, Clone)]
pub struct LoginRateLimiter {
    /// Map of attempt keys to trackers
    attempts: Arc<DashMap<String, AttemptTracker>>,
    /// Attempts allowed per window
    max_attempts: u32,
    /// Window length
    window: Duration,
    clear_policy: ClearPolicy,
    /// Earliest instant the next expiry sweep may run
    next_sweep: Arc<Mutex<Instant>>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW, ClearPolicy::default())
    }
}

impl LoginRateLimiter {
    /// Create a new limiter
    pub fn new(max_attempts: u32, window: Duration, clear_policy: ClearPolicy) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            window,
            clear_policy,
            next_sweep: Arc::new(Mutex::new(Instant::now() + window)),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.max_attempts, settings.window(), settings.clear_on)
    }

    /// Record an attempt for `key`, or refuse it once the window is full.
    ///
    /// The returned permit must be settled with the request's outcome.
    pub fn check_and_record(&self, key: &str) -> Result<AttemptPermit, AuthError> {
        let now = Instant::now();
        self.sweep_if_due(now);

        match self.attempts.entry(key.to_string()) {
            Entry::Occupied(mut entry) if entry.get().expires_at >= now => {
                let tracker = entry.get_mut();
                if tracker.count >= self.max_attempts {
                    warn!(key, attempts = tracker.count, "login attempts exhausted");
                    metrics::counter!(crate::metrics::LOGIN_RATE_LIMITED).increment(1);
                    return Err(AuthError::TooManyAttempts);
                }
                tracker.count += 1;
                debug!(key, attempts = tracker.count, "login attempt recorded");
            }
            Entry::Occupied(mut entry) => {
                entry.insert(self.fresh_tracker(now));
                debug!(key, "login window expired, counter restarted");
            }
            Entry::Vacant(entry) => {
                entry.insert(self.fresh_tracker(now));
                debug!(key, "login window opened");
            }
        }

        Ok(AttemptPermit {
            attempts: Arc::clone(&self.attempts),
            key: key.to_string(),
            clear_policy: self.clear_policy,
        })
    }

    /// Purge expired trackers once a window has passed since the last sweep.
    /// Must not run while a map entry is held.
    fn sweep_if_due(&self, now: Instant) {
        let mut next = match self.next_sweep.try_lock() {
            Ok(next) => next,
            // another caller is sweeping
            Err(TryLockError::WouldBlock) => return,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        if now < *next {
            return;
        }
        *next = now + self.window;
        drop(next);

        let removed = self.purge_expired();
        if removed > 0 {
            debug!(removed, "expired login trackers purged");
        }
    }

    fn fresh_tracker(&self, now: Instant) -> AttemptTracker {
        AttemptTracker {
            count: 1,
            expires_at: now + self.window,
        }
    }

    /// Attempts recorded for `key` in its live window
    pub fn attempts_for(&self, key: &str) -> u32 {
        let now = Instant::now();
        self.attempts
            .get(key)
            .filter(|tracker| tracker.expires_at >= now)
            .map_or(0, |tracker| tracker.count)
    }

    /// Number of keys currently tracked, expired or not
    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }

    /// Clean up expired trackers
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.attempts.len();
        self.attempts.retain(|_, tracker| tracker.expires_at >= now);
        let removed = before.saturating_sub(self.attempts.len());
        metrics::gauge!(crate::metrics::ATTEMPT_TRACKERS).set(self.attempts.len() as f64);
        removed
    }
}

/// Completion hook handed out for every allowed attempt
#[derive(Debug)]
#[must_use = "settle the permit once the request outcome is known"]
pub struct AttemptPermit {
    attempts: Arc<DashMap<String, AttemptTracker>>,
    key: String,
    clear_policy: ClearPolicy,
}

impl AttemptPermit {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Report the outcome; clears the key when the policy says so
    pub fn settle(self, outcome: AttemptOutcome) {
        if self.clear_policy.clears(outcome) && self.attempts.remove(&self.key).is_some() {
            debug!(key = %self.key, ?outcome, "login attempts cleared");
        }
    }
}
