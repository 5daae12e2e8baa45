// ============================
// crates/auth-lib/src/metrics.rs
// ============================
//! Central place for metric keys
pub const SIGNUP_COMPLETED: &str = "auth.signup.completed";
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const LOGIN_RATE_LIMITED: &str = "auth.login.rate_limited";
pub const REFRESH_ROTATED: &str = "auth.refresh.rotated";
pub const REFRESH_REJECTED: &str = "auth.refresh.rejected";
pub const LOGOUT: &str = "auth.logout";
pub const ATTEMPT_TRACKERS: &str = "auth.rate_limit.trackers";
