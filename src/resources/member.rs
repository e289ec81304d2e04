use serde_json::Map;

use crate::document::{MemberDescriptor, ReplicaSetRequest};
use crate::resources::common::{DEFAULT_PRIORITY, DEFAULT_VOTES, normalize_host};

/// Tuning options for a single member, defaulting to the cluster defaults
#[derive(Clone, Debug, PartialEq)]
pub struct MemberOptions {
    pub arbiter_only: bool,
    pub build_indexes: bool,
    pub hidden: bool,
    pub priority: f64,
    pub slave_delay: i64,
    pub votes: i32,
}

impl Default for MemberOptions {
    fn default() -> Self {
        Self {
            arbiter_only: false,
            build_indexes: true,
            hidden: false,
            priority: DEFAULT_PRIORITY,
            slave_delay: 0,
            votes: DEFAULT_VOTES,
        }
    }
}

impl From<&ReplicaSetRequest> for MemberOptions {
    fn from(request: &ReplicaSetRequest) -> Self {
        Self {
            arbiter_only: request.arbiter_only,
            build_indexes: request.build_indexes,
            hidden: request.hidden,
            priority: request.priority,
            slave_delay: request.slave_delay,
            votes: request.votes,
        }
    }
}

/// Build a member entry, omitting every field that equals its default.
///
/// The id is left at 0; the engine assigns it from the live configuration. A
/// missing host is carried through for bootstrap without an explicit member.
pub fn build_member(host: Option<&str>, options: &MemberOptions) -> MemberDescriptor {
    MemberDescriptor {
        id: 0,
        host: host.map(normalize_host),
        arbiter_only: options.arbiter_only.then_some(true),
        build_indexes: (!options.build_indexes).then_some(false),
        hidden: options.hidden.then_some(true),
        priority: (options.priority != DEFAULT_PRIORITY).then_some(options.priority),
        slave_delay: (options.slave_delay != 0).then_some(options.slave_delay),
        votes: (options.votes != DEFAULT_VOTES).then_some(options.votes),
        extra: Map::new(),
    }
}
