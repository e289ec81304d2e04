//! First-time initiation of a replica set
//!
//! Initiation bypasses the diff logic: an already initiated set is never
//! re-initiated, and a fresh one is initiated either bare (the server builds a
//! single-member config for itself) or with an explicit single-member config.

use tracing::{info, instrument};

use crate::controller::context::Context;
use crate::controller::error::{Error, Result};
use crate::controller::reconciler::ReconcileOutcome;
use crate::controller::stabilization::wait_for_primary;
use crate::document::{HelloResponse, MemberDescriptor, ReplicaSetConfig};
use crate::resources::client::{AdminCommand, ClientError, ReplicaSetClient};

/// Build the configuration submitted with an explicit first member.
///
/// The member id is forced to 0 and the document carries neither a version nor
/// settings.
pub fn initial_config(replset: &str, member: MemberDescriptor) -> ReplicaSetConfig {
    let mut config = ReplicaSetConfig::new(replset);
    config.members.push(MemberDescriptor { id: 0, ..member });
    config
}

/// Initiate the replica set if the connected server is not part of one yet.
///
/// Initiation is attempted once; any command failure, including the codes the
/// reconfiguration loop treats as transient, is an `OperationError`.
#[instrument(
    skip(ctx, member),
    fields(
        replset = replset.unwrap_or(""),
        member = member.as_ref().and_then(|m| m.host.as_deref()).unwrap_or("")
    )
)]
pub async fn initiate<C: ReplicaSetClient>(
    ctx: &Context<C>,
    replset: Option<&str>,
    member: Option<MemberDescriptor>,
) -> Result<ReconcileOutcome> {
    let member = member.filter(|m| m.host.is_some());

    let config = match (member, replset) {
        (None, _) => None,
        (Some(member), Some(name)) => Some(initial_config(name, member)),
        (Some(_), None) => {
            return Err(Error::ValidationError(
                "replset must be specified when member is specified on state=initiated"
                    .to_string(),
            ));
        }
    };

    let reply = ctx.client.run_command(&AdminCommand::IsMaster).await?;
    let hello: HelloResponse = serde_json::from_value(reply)?;
    if let Some(set_name) = hello.set_name {
        info!(%set_name, "Replica set already initiated");
        return Ok(ReconcileOutcome::Unchanged);
    }

    match &config {
        Some(config) => info!(
            replset = %config.identifier,
            "Initiating replica set with explicit member"
        ),
        None => info!("Initiating replica set with server defaults"),
    }

    ctx.client
        .run_command(&AdminCommand::ReplSetInitiate(config))
        .await
        .map_err(|e| match e {
            ClientError::Command { code, message } => Error::OperationError { code, message },
            other => Error::from(other),
        })?;

    wait_for_primary(&ctx.client, &ctx.config.stabilization).await?;
    Ok(ReconcileOutcome::Changed)
}
