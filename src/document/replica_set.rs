use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::controller::error::{Error, Result};
use crate::resources::common::DEFAULT_HEARTBEAT_SECS;

/// ReplicaSetConfig is the replication configuration document held by the cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSetConfig {
    /// Replica set name, immutable once the set is initiated
    #[serde(rename = "_id")]
    pub identifier: String,

    /// Configuration version; a reconfiguration must submit a strictly greater value
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: u64,

    /// Ordered member list
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,

    /// Global replication settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsBlock>,

    /// Fields this crate does not model (protocolVersion, configsvr, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(version: &u64) -> bool {
    *version == 0
}

impl ReplicaSetConfig {
    /// Create an unversioned configuration, as submitted with `replSetInitiate`
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: 0,
            members: Vec::new(),
            settings: None,
            extra: Map::new(),
        }
    }

    /// Find the member whose normalized host matches exactly
    pub fn find_member(&self, host: &str) -> Option<&MemberDescriptor> {
        self.members
            .iter()
            .find(|m| m.host.as_deref() == Some(host))
    }

    /// Id to assign to the next added member: 0 for an empty set, else max + 1
    pub fn next_member_id(&self) -> u32 {
        self.members
            .iter()
            .map(|m| m.id)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Append a member and bump the version.
    ///
    /// Rejects a host that is already part of the set; the config is left untouched
    /// in that case.
    pub fn add_member(&mut self, member: MemberDescriptor) -> Result<()> {
        if let Some(host) = member.host.as_deref()
            && self.find_member(host).is_some()
        {
            return Err(Error::InvariantViolation(format!(
                "host {} is already a member of replica set {}",
                host, self.identifier
            )));
        }

        self.members.push(member);
        self.version += 1;
        Ok(())
    }

    /// Remove the first member with the given host.
    ///
    /// The version is bumped whether or not a member matched. Returns `true` when a
    /// member was removed.
    pub fn remove_member(&mut self, host: &str) -> bool {
        let position = self
            .members
            .iter()
            .position(|m| m.host.as_deref() == Some(host));

        if let Some(index) = position {
            self.members.remove(index);
        }

        self.version += 1;
        position.is_some()
    }

    /// Replace the settings block and bump the version.
    ///
    /// Live settings keys that `settings` does not model are carried over.
    pub fn replace_settings(&mut self, mut settings: SettingsBlock) {
        if let Some(current) = self.settings.take() {
            for (key, value) in current.extra {
                settings.extra.entry(key).or_insert(value);
            }
        }
        self.settings = Some(settings);
        self.version += 1;
    }

    /// Hosts of all members, in configuration order
    pub fn hosts(&self) -> Vec<&str> {
        self.members.iter().filter_map(|m| m.host.as_deref()).collect()
    }
}

/// A single replica-set member entry.
///
/// Tuning fields are only present when they differ from the cluster defaults so that
/// the submitted document stays minimal.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberDescriptor {
    /// Member id, unique within the set and never reused for another host
    #[serde(rename = "_id", default)]
    pub id: u32,

    /// host:port, normalized to always carry a port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbiter_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_indexes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Election priority, absent means 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,

    /// Replication delay in seconds, absent means 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_delay: Option<i64>,

    /// Election votes, absent means 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<i32>,

    /// Member fields this crate does not model (tags, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Global replication settings (`settings` sub-document)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBlock {
    #[serde(default = "default_chaining_allowed")]
    pub chaining_allowed: bool,

    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: i64,

    #[serde(default)]
    pub get_last_error_defaults: WriteConcernDefaults,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_chaining_allowed() -> bool {
    true
}

fn default_heartbeat_timeout_secs() -> i64 {
    DEFAULT_HEARTBEAT_SECS
}

/// Cluster defaults, also used for keys missing from a live settings block
impl Default for SettingsBlock {
    fn default() -> Self {
        Self {
            chaining_allowed: default_chaining_allowed(),
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
            get_last_error_defaults: WriteConcernDefaults::default(),
            extra: Map::new(),
        }
    }
}

impl SettingsBlock {
    /// Compare only the fields this crate manages, ignoring unmodelled live keys
    pub fn same_managed_fields(&self, other: &SettingsBlock) -> bool {
        self.chaining_allowed == other.chaining_allowed
            && self.heartbeat_timeout_secs == other.heartbeat_timeout_secs
            && self.get_last_error_defaults == other.get_last_error_defaults
    }
}

/// Default write concern applied by the cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WriteConcernDefaults {
    #[serde(default)]
    pub w: WriteConcernMode,

    /// Require journal confirmation
    #[serde(default)]
    pub j: bool,

    /// Write concern timeout in milliseconds, 0 means no timeout
    #[serde(default)]
    pub wtimeout: i64,
}

impl Default for WriteConcernDefaults {
    fn default() -> Self {
        Self {
            w: WriteConcernMode::default(),
            j: false,
            wtimeout: 0,
        }
    }
}

/// Write concern `w` value: a node count or a named mode such as "majority"
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum WriteConcernMode {
    Nodes(i64),
    Named(String),
}

impl Default for WriteConcernMode {
    fn default() -> Self {
        WriteConcernMode::Nodes(1)
    }
}

impl WriteConcernMode {
    /// Integer when the token parses as one, otherwise kept as a named mode
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        match trimmed.parse::<i64>() {
            Ok(nodes) => WriteConcernMode::Nodes(nodes),
            Err(_) => WriteConcernMode::Named(trimmed.to_string()),
        }
    }
}

impl std::fmt::Display for WriteConcernMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteConcernMode::Nodes(n) => write!(f, "{}", n),
            WriteConcernMode::Named(name) => write!(f, "{}", name),
        }
    }
}
