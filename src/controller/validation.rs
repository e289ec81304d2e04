//! Validation of desired-state requests
//!
//! Checks the request before any command reaches the cluster:
//! - a member is required for `present` and `absent`
//! - `initiated` with a member requires a replica set name
//! - member tuning values are within range
//! - settings values are non-negative

use crate::controller::error::{Error, Result};
use crate::document::{DesiredState, ReplicaSetRequest};
use crate::resources::common::split_host_port;

/// Validate a request
pub fn validate_request(request: &ReplicaSetRequest) -> Result<()> {
    validate_state_requirements(request)?;
    if let Some(member) = request.member.as_deref() {
        validate_member_host(member)?;
    }
    validate_member_tuning(request)?;
    validate_settings(request)?;
    Ok(())
}

/// Validate fields required by the requested state
fn validate_state_requirements(request: &ReplicaSetRequest) -> Result<()> {
    match request.state {
        DesiredState::Present | DesiredState::Absent if request.member.is_none() => {
            Err(Error::ValidationError(format!(
                "member is required when state={}",
                request.state
            )))
        }
        DesiredState::Initiated if request.member.is_some() && request.replset.is_none() => {
            Err(Error::ValidationError(
                "replset must be specified when member is specified on state=initiated"
                    .to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Validate a host[:port] string
fn validate_member_host(member: &str) -> Result<()> {
    let trimmed = member.trim();
    if trimmed.is_empty() {
        return Err(Error::ValidationError("member must not be empty".to_string()));
    }

    if trimmed.contains(':') {
        match split_host_port(trimmed) {
            Some(("", _)) => {
                return Err(Error::ValidationError(format!(
                    "member {} has no host name",
                    member
                )));
            }
            Some(_) => {}
            None => {
                return Err(Error::ValidationError(format!(
                    "member {} has an invalid port",
                    member
                )));
            }
        }
    }

    Ok(())
}

/// Validate member tuning values
fn validate_member_tuning(request: &ReplicaSetRequest) -> Result<()> {
    if !request.priority.is_finite() || request.priority < 0.0 {
        return Err(Error::ValidationError(format!(
            "priority must be a non-negative number: {}",
            request.priority
        )));
    }

    if request.votes < 0 {
        return Err(Error::ValidationError(format!(
            "votes must not be negative: {}",
            request.votes
        )));
    }

    if request.slave_delay < 0 {
        return Err(Error::ValidationError(format!(
            "slave_delay must not be negative: {}",
            request.slave_delay
        )));
    }

    if request.votes > 1 {
        tracing::warn!(
            "Member votes set to {}; each member should have 0 or 1 votes",
            request.votes
        );
    }

    Ok(())
}

/// Validate settings values
fn validate_settings(request: &ReplicaSetRequest) -> Result<()> {
    if let Some(heartbeat) = request.heartbeat
        && heartbeat < 0
    {
        return Err(Error::ValidationError(format!(
            "heartbeat must not be negative: {}",
            heartbeat
        )));
    }

    if let Some(wtimeout) = request.wtimeout
        && wtimeout < 0
    {
        return Err(Error::ValidationError(format!(
            "wtimeout must not be negative: {}",
            wtimeout
        )));
    }

    Ok(())
}
