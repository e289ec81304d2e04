use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resources::common::DEFAULT_PORT;

/// ReplicaSetRequest is the declarative desired state for one invocation
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSetRequest {
    /// Host running the database
    #[serde(default = "default_login_host", alias = "login_host")]
    pub login_host: String,

    /// Port to connect to
    #[serde(default = "default_login_port", alias = "login_port")]
    pub login_port: u16,

    /// Username to authenticate with
    #[serde(default, alias = "login_user", skip_serializing_if = "Option::is_none")]
    pub login_user: Option<String>,

    /// Password to authenticate with
    #[serde(default, alias = "login_password", skip_serializing)]
    pub login_password: Option<String>,

    /// Desired state of the replica set
    pub state: DesiredState,

    /// Replica set name, required when initiating with an explicit member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replset: Option<String>,

    /// host[:port] to add or remove
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,

    /// Add the member as an arbiter
    #[serde(default, alias = "arbiter_only")]
    pub arbiter_only: bool,

    /// Whether the member builds indexes.
    /// Do not set to false for members that receive client queries.
    #[serde(default = "default_true", alias = "build_indexes")]
    pub build_indexes: bool,

    /// Hide the member from client read routing
    #[serde(default)]
    pub hidden: bool,

    /// Relative eligibility to become primary
    #[serde(default = "default_priority")]
    pub priority: f64,

    /// Seconds this member lags behind the primary
    #[serde(default, alias = "slave_delay")]
    pub slave_delay: i64,

    /// Votes this member casts in elections
    #[serde(default = "default_votes")]
    pub votes: i32,

    /// Allow secondaries to replicate from other secondaries
    #[serde(default, alias = "chaining_allowed", skip_serializing_if = "Option::is_none")]
    pub chaining_allowed: Option<bool>,

    /// Heartbeat timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<i64>,

    /// Default write concern `w` (node count or named mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woption: Option<String>,

    /// Require journal confirmation by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joption: Option<bool>,

    /// Default write concern timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wtimeout: Option<i64>,
}

fn default_login_host() -> String {
    "localhost".to_string()
}

fn default_login_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_priority() -> f64 {
    1.0
}

fn default_votes() -> i32 {
    1
}

impl ReplicaSetRequest {
    /// Request with every optional field at its default
    pub fn new(state: DesiredState) -> Self {
        Self {
            login_host: default_login_host(),
            login_port: default_login_port(),
            login_user: None,
            login_password: None,
            state,
            replset: None,
            member: None,
            arbiter_only: false,
            build_indexes: true,
            hidden: false,
            priority: default_priority(),
            slave_delay: 0,
            votes: default_votes(),
            chaining_allowed: None,
            heartbeat: None,
            woption: None,
            joption: None,
            wtimeout: None,
        }
    }

    /// Credentials, when both user and password were given
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.login_user.as_deref(), self.login_password.as_deref()) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

/// Desired state of the replica set
#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The set exists (initiate it if needed)
    Initiated,
    /// Global settings match the request
    Reconf,
    /// The member is part of the set
    Present,
    /// The member is not part of the set
    Absent,
}

impl std::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesiredState::Initiated => write!(f, "initiated"),
            DesiredState::Reconf => write!(f, "reconf"),
            DesiredState::Present => write!(f, "present"),
            DesiredState::Absent => write!(f, "absent"),
        }
    }
}

/// JSON schema of [`ReplicaSetRequest`] for orchestrators
pub fn request_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(ReplicaSetRequest)
}
