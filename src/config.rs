//! Engine configuration
//!
//! Retry and stabilization bounds for one invocation. Values come from defaults,
//! a serialized document, or `REPLSET_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::controller::error::BackoffConfig;

/// Default maximum number of reconciliation attempts per invocation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default number of status polls while waiting for a primary
pub const DEFAULT_STABILIZATION_TIMEOUT_SECS: u32 = 60;

/// Default interval between status polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default shortest backoff while the cluster has no primary
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 2;

/// Default longest backoff while the cluster has no primary
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 8;

pub const ENV_MAX_ATTEMPTS: &str = "REPLSET_MAX_ATTEMPTS";
pub const ENV_RETRY_DEADLINE_SECS: &str = "REPLSET_RETRY_DEADLINE_SECS";
pub const ENV_STABILIZATION_TIMEOUT_SECS: &str = "REPLSET_STABILIZATION_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_MS: &str = "REPLSET_POLL_INTERVAL_MS";

/// Complete engine configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub stabilization: StabilizationConfig,
}

/// Bounds for the reconciliation retry loop
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Attempts before giving up with `RetriesExhausted`
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Optional wall-clock budget across all attempts, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,

    #[serde(default = "default_backoff_min_secs")]
    pub backoff_min_secs: u64,

    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_min_secs() -> u64 {
    DEFAULT_BACKOFF_MIN_SECS
}

fn default_backoff_max_secs() -> u64 {
    DEFAULT_BACKOFF_MAX_SECS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline_secs: None,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            min_delay: Duration::from_secs(self.backoff_min_secs),
            max_delay: Duration::from_secs(self.backoff_max_secs),
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Bounds for the wait-for-primary poll loop
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StabilizationConfig {
    /// Number of polls before timing out (one per interval)
    #[serde(default = "default_stabilization_timeout_secs")]
    pub timeout_secs: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_stabilization_timeout_secs() -> u32 {
    DEFAULT_STABILIZATION_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_STABILIZATION_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl StabilizationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl EngineConfig {
    /// Defaults overridden by any `REPLSET_*` variables that are set.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(attempts) = parse_var(&lookup, ENV_MAX_ATTEMPTS) {
            config.retry.max_attempts = attempts;
        }
        if let Some(deadline) = parse_var(&lookup, ENV_RETRY_DEADLINE_SECS) {
            config.retry.deadline_secs = Some(deadline);
        }
        if let Some(timeout) = parse_var(&lookup, ENV_STABILIZATION_TIMEOUT_SECS) {
            config.stabilization.timeout_secs = timeout;
        }
        if let Some(interval) = parse_var(&lookup, ENV_POLL_INTERVAL_MS) {
            config.stabilization.poll_interval_ms = interval;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{} has invalid value {:?}, using default", key, raw);
            None
        }
    }
}
