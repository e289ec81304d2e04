use serde_json::Map;

use crate::document::{ReplicaSetRequest, SettingsBlock, WriteConcernDefaults, WriteConcernMode};
use crate::resources::common::DEFAULT_HEARTBEAT_SECS;

/// Requested global settings; `None` (and zero/false) fall back to the defaults
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsOptions {
    pub chaining_allowed: Option<bool>,
    pub heartbeat_secs: Option<i64>,
    pub write_concern: Option<String>,
    pub journal: Option<bool>,
    pub wtimeout_ms: Option<i64>,
}

impl From<&ReplicaSetRequest> for SettingsOptions {
    fn from(request: &ReplicaSetRequest) -> Self {
        Self {
            chaining_allowed: request.chaining_allowed,
            heartbeat_secs: request.heartbeat,
            write_concern: request.woption.clone(),
            journal: request.joption,
            wtimeout_ms: request.wtimeout,
        }
    }
}

/// Build the settings block.
///
/// Every field is substituted independently: chaining defaults to true (an explicit
/// false collapses to the default as well), heartbeat to 10s, `w` to 1, `j` to false
/// and `wtimeout` to 0.
pub fn build_settings(options: &SettingsOptions) -> SettingsBlock {
    let heartbeat_timeout_secs = match options.heartbeat_secs {
        Some(secs) if secs != 0 => secs,
        _ => DEFAULT_HEARTBEAT_SECS,
    };

    let w = options
        .write_concern
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .map(WriteConcernMode::parse)
        .unwrap_or(WriteConcernMode::Nodes(1));

    SettingsBlock {
        // TODO: honour an explicit `false` once callers can tell it apart from unset
        chaining_allowed: options.chaining_allowed.filter(|allowed| *allowed).unwrap_or(true),
        heartbeat_timeout_secs,
        get_last_error_defaults: WriteConcernDefaults {
            w,
            j: options.journal.unwrap_or(false),
            wtimeout: options.wtimeout_ms.unwrap_or(0),
        },
        extra: Map::new(),
    }
}
