//! Client seam towards the data store
//!
//! The engine talks to the cluster only through [`ReplicaSetClient`]. Transport,
//! authentication mechanics and wire encoding live behind the trait; the engine
//! needs command execution that fails with a numeric code, the current
//! replication configuration and the current replication status.

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::document::{ReplicaSetConfig, ReplicaSetStatus};

/// Cluster error code: stepdown or election in progress, no primary yet
pub const CODE_NOT_PRIMARY_YET: i32 = 109;

/// Cluster error code: a newer configuration version is already installed
pub const CODE_NEWER_CONFIG: i32 = 103;

/// Errors reported by a [`ReplicaSetClient`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The server executed the command and rejected it
    #[error("Command failed with code {code}: {message}")]
    Command { code: i32, message: String },

    /// The connection dropped and the driver reconnected (typically a new primary)
    #[error("Connection reset, reconnected: {0}")]
    AutoReconnect(String),

    /// No connection could be established
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The reply could not be decoded
    #[error("Malformed reply: {0}")]
    Decode(String),
}

impl ClientError {
    /// Numeric code carried by a command failure
    pub fn code(&self) -> Option<i32> {
        match self {
            ClientError::Command { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Administrative commands the engine issues
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    /// Role and replica-set identity of the connected member
    IsMaster,
    /// Initiate the set, bare or with an explicit configuration
    ReplSetInitiate(Option<ReplicaSetConfig>),
    /// Replace the configuration
    ReplSetReconfig(ReplicaSetConfig),
}

impl AdminCommand {
    /// Command name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::IsMaster => "isMaster",
            AdminCommand::ReplSetInitiate(_) => "replSetInitiate",
            AdminCommand::ReplSetReconfig(_) => "replSetReconfig",
        }
    }

    /// Command document keyed by the command name
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        let argument = match self {
            AdminCommand::IsMaster | AdminCommand::ReplSetInitiate(None) => json!(1),
            AdminCommand::ReplSetInitiate(Some(config)) | AdminCommand::ReplSetReconfig(config) => {
                serde_json::to_value(config)?
            }
        };
        let mut document = Map::new();
        document.insert(self.name().to_string(), argument);
        Ok(Value::Object(document))
    }
}

/// Operations the reconciliation engine needs from the data store
#[allow(async_fn_in_trait)]
pub trait ReplicaSetClient {
    /// Run an administrative command against the admin database
    async fn run_command(&self, command: &AdminCommand) -> ClientResult<Value>;

    /// Fetch the replication configuration currently installed
    async fn fetch_config(&self) -> ClientResult<ReplicaSetConfig>;

    /// Fetch replication status; a non-ok status is returned as data, not an error
    async fn fetch_status(&self) -> ClientResult<ReplicaSetStatus>;

    /// List database names; fails with a command error when authentication is required
    async fn list_database_names(&self) -> ClientResult<Vec<String>>;

    /// Authenticate against the admin database
    async fn authenticate(&self, user: &str, password: &str) -> ClientResult<()>;
}

/// Authenticate only when the server requires it.
///
/// Listing databases succeeds on servers without access control; only a command
/// failure there, combined with supplied credentials, triggers authentication.
/// Returns whether authentication was performed.
pub async fn authenticate_if_required<C: ReplicaSetClient>(
    client: &C,
    credentials: Option<(&str, &str)>,
) -> ClientResult<bool> {
    let Some((user, password)) = credentials else {
        return Ok(false);
    };

    match client.list_database_names().await {
        Ok(_) => {
            debug!("Server accepts unauthenticated commands, skipping authentication");
            Ok(false)
        }
        Err(ClientError::Command { code, .. }) => {
            debug!(code, "Unauthenticated probe rejected, authenticating");
            client.authenticate(user, password).await?;
            info!(user, "Authenticated");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}
