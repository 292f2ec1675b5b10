//! Constants used throughout the application
//!
//! This module centralizes magic values and storage keys to improve
//! maintainability and consistency.

// Identity reconciliation
/// Creation-time tolerance when correlating a local project with a remote
/// one by name. Two records are considered the same logical entity when
/// their names match and their creation times differ by at most this.
pub const RECONCILE_WINDOW_SECS: i64 = 90;

// Outbox retry policy defaults
/// Attempts per job before the lane gives up.
pub const SYNC_RETRY_MAX_ATTEMPTS: u32 = 3;
/// Base backoff between attempts; grows linearly with the attempt number.
pub const SYNC_RETRY_BACKOFF_MS: u64 = 500;

// Config validation limits
pub const RETRY_ATTEMPTS_MIN: u32 = 1;
pub const RETRY_ATTEMPTS_MAX: u32 = 10;
pub const RETRY_BACKOFF_MAX_MS: u64 = 60_000;

// Persisted application-state keys
pub const STATE_KEY_CURRENT_PROJECT: &str = "current_project";
pub const STATE_KEY_SYNC_ENABLED: &str = "sync_enabled";

// Messages
pub const CONFIG_GENERATED: &str = "Generated default configuration file";
