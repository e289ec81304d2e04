//! Error types for the replica-set reconciler
//!
//! Errors fall into three groups:
//! - **Permanent**: bad input or a cluster failure code outside the transient set
//! - **Transient**: the cluster has no primary yet or a newer config won a race;
//!   handled by the retry loop and only surfaced through `RetriesExhausted`
//! - **Stabilization**: the cluster never settled on a primary in time

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::resources::client::{CODE_NEWER_CONFIG, CODE_NOT_PRIMARY_YET, ClientError};

/// Error variants are named with the `Error` suffix where that reads better at call
/// sites (e.g. `ValidationError`, `OperationError`).
#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum Error {
    // ============================================
    // Permanent Errors (do not retry)
    // ============================================
    /// Malformed or missing desired-state input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Could not connect or authenticate to the cluster
    #[error("Unable to connect to database: {0}")]
    ConnectivityError(String),

    /// Cluster rejected a command with a non-retryable code
    #[error("Operation failed with code {code}: {message}")]
    OperationError { code: i32, message: String },

    /// A document-model invariant would be broken
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Client failure outside of a submission (config read, isMaster, ...)
    #[error("Client error: {0}")]
    Client(ClientError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // ============================================
    // Transient Errors (retried by the engine)
    // ============================================
    /// Another writer bumped the version first, or no primary is available yet
    #[error("Transient configuration conflict (code {code}): {message}")]
    TransientConfigConflict { code: i32, message: String },

    // ============================================
    // Bounded-retry and stabilization failures
    // ============================================
    /// The retry budget ran out while the cluster kept reporting transient failures
    #[error("Gave up after {attempts} attempts, last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// No primary was observed before the deadline
    #[error("Reached timeout after {polls} polls while waiting for replica set status to become ok with a primary")]
    StabilizationTimeout { polls: u32 },
}

impl Error {
    /// Map a failed reconfiguration submission into the taxonomy.
    ///
    /// Codes 103 and 109 are transient; any other command code is fatal.
    /// Non-command client failures are kept as `Client`.
    pub fn from_submission(error: ClientError) -> Self {
        match error {
            ClientError::Command { code, message }
                if code == CODE_NOT_PRIMARY_YET || code == CODE_NEWER_CONFIG =>
            {
                Error::TransientConfigConflict { code, message }
            }
            ClientError::Command { code, message } => Error::OperationError { code, message },
            other => Error::Client(other),
        }
    }

    /// Check if this error is retried by the engine
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientConfigConflict { .. })
    }

    /// Cluster error code carried by this error, if any
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::OperationError { code, .. } | Error::TransientConfigConflict { code, .. } => {
                Some(*code)
            }
            Error::Client(e) => e.code(),
            _ => None,
        }
    }
}

impl From<ClientError> for Error {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Connection(message) => Error::ConnectivityError(message),
            other => Error::Client(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Randomized backoff used while the cluster has no primary
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffConfig {
    /// Shortest delay
    pub min_delay: Duration,
    /// Longest delay
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl BackoffConfig {
    /// Uniformly random delay in `[min_delay, max_delay]`, whole seconds
    pub fn delay(&self) -> Duration {
        let min = self.min_delay.as_secs();
        let max = self.max_delay.as_secs().max(min);
        Duration::from_secs(rand::rng().random_range(min..=max))
    }

    /// Delay before retrying after `error`; zero for conflicts that need no wait
    pub fn delay_for_error(&self, error: &Error) -> Duration {
        match error.code() {
            Some(CODE_NOT_PRIMARY_YET) => self.delay(),
            _ => Duration::ZERO,
        }
    }
}
