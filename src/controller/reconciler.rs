//! Reconciliation logic for replica-set membership and settings
//!
//! Every attempt re-reads the live configuration, decides whether an edit is
//! needed, applies it in memory and submits the full replacement document. The
//! cluster's version check serializes concurrent writers; a transient rejection
//! sends the engine back to a fresh read.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::controller::bootstrap::initiate;
use crate::controller::context::Context;
use crate::controller::error::{Error, Result};
use crate::controller::state_machine::{PhaseTracker, ReconcileEvent, ReconcileStateMachine};
use crate::controller::validation::validate_request;
use crate::document::{
    DesiredState, MemberDescriptor, ReplicaSetConfig, ReplicaSetRequest, SettingsBlock,
};
use crate::resources::client::{
    AdminCommand, ClientError, ReplicaSetClient, authenticate_if_required,
};
use crate::resources::member::{MemberOptions, build_member};
use crate::resources::settings::{SettingsOptions, build_settings};

/// Result of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileOutcome {
    /// Live state already matched; nothing was submitted
    Unchanged,
    /// A change was submitted and accepted
    Changed,
    /// A change was submitted but the connection dropped before the reply.
    /// The caller has to reconcile again to learn whether it applied.
    Unconfirmed,
}

impl ReconcileOutcome {
    /// Whether a change was (or may have been) made
    pub fn changed(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged)
    }

    /// Whether the outcome is known for certain
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unconfirmed)
    }
}

/// Desired membership of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Present,
    Absent,
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Membership::Present => write!(f, "present"),
            Membership::Absent => write!(f, "absent"),
        }
    }
}

/// Report returned to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub changed: bool,
    pub confirmed: bool,
}

impl From<ReconcileOutcome> for RunReport {
    fn from(outcome: ReconcileOutcome) -> Self {
        Self {
            changed: outcome.changed(),
            confirmed: outcome.is_confirmed(),
        }
    }
}

/// Handle one desired-state request end to end
#[instrument(
    skip(ctx, request),
    fields(state = %request.state, member = request.member.as_deref().unwrap_or(""))
)]
pub async fn run<C: ReplicaSetClient>(
    ctx: &Context<C>,
    request: &ReplicaSetRequest,
) -> Result<RunReport> {
    validate_request(request)?;

    authenticate_if_required(&ctx.client, request.credentials())
        .await
        .map_err(|e| Error::ConnectivityError(format!("authentication failed: {}", e)))?;

    let member = build_member(request.member.as_deref(), &MemberOptions::from(request));

    let outcome = match request.state {
        DesiredState::Initiated => {
            initiate(ctx, request.replset.as_deref(), Some(member)).await?
        }
        DesiredState::Present => reconcile_member(ctx, member, Membership::Present).await?,
        DesiredState::Absent => reconcile_member(ctx, member, Membership::Absent).await?,
        DesiredState::Reconf => {
            let settings = build_settings(&SettingsOptions::from(request));
            reconcile_settings(ctx, settings).await?
        }
    };

    info!(?outcome, "Reconciliation completed");
    Ok(outcome.into())
}

/// Converge the membership of `desired.host` to `membership`
#[instrument(
    skip(ctx, desired),
    fields(host = desired.host.as_deref().unwrap_or(""), membership = %membership)
)]
pub async fn reconcile_member<C: ReplicaSetClient>(
    ctx: &Context<C>,
    mut desired: MemberDescriptor,
    membership: Membership,
) -> Result<ReconcileOutcome> {
    let host = desired.host.clone().ok_or_else(|| {
        Error::ValidationError(format!("member is required when state={}", membership))
    })?;

    converge(ctx, |mut config| {
        desired.id = config.next_member_id();
        let is_member = config.find_member(&host).is_some();

        match (membership, is_member) {
            (Membership::Present, true) | (Membership::Absent, false) => {
                debug!("Membership already converged");
                Ok(None)
            }
            (Membership::Present, false) => {
                info!(id = desired.id, "Adding member");
                config.add_member(desired.clone())?;
                Ok(Some(config))
            }
            (Membership::Absent, true) => {
                info!("Removing member");
                config.remove_member(&host);
                Ok(Some(config))
            }
        }
    })
    .await
}

/// Converge the global settings block to `desired`
#[instrument(skip(ctx, desired))]
pub async fn reconcile_settings<C: ReplicaSetClient>(
    ctx: &Context<C>,
    desired: SettingsBlock,
) -> Result<ReconcileOutcome> {
    converge(ctx, |mut config| {
        let converged = config
            .settings
            .as_ref()
            .is_some_and(|live| live.same_managed_fields(&desired));

        if converged {
            debug!("Settings already converged");
            return Ok(None);
        }

        info!(
            chaining_allowed = desired.chaining_allowed,
            heartbeat_timeout_secs = desired.heartbeat_timeout_secs,
            w = %desired.get_last_error_defaults.w,
            "Replacing settings"
        );
        config.replace_settings(desired.clone());
        Ok(Some(config))
    })
    .await
}

/// Bounded read-decide-submit loop shared by member and settings changes.
///
/// `plan` receives a freshly read configuration and returns the replacement to
/// submit, or `None` when nothing needs to change.
async fn converge<C, F>(ctx: &Context<C>, mut plan: F) -> Result<ReconcileOutcome>
where
    C: ReplicaSetClient,
    F: FnMut(ReplicaSetConfig) -> Result<Option<ReplicaSetConfig>>,
{
    let machine = ReconcileStateMachine::new();
    let policy = &ctx.config.retry;
    let backoff = policy.backoff();
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let mut phases = PhaseTracker::new(&machine);

        let current = match ctx.client.fetch_config().await {
            Ok(config) => config,
            Err(e) => {
                phases.fire(ReconcileEvent::FatalError);
                error!(attempt, "Failed to read replica set configuration: {}", e);
                return Err(e.into());
            }
        };
        phases.fire(ReconcileEvent::ConfigRead);
        debug!(
            attempt,
            version = current.version,
            members = current.members.len(),
            "Read replica set configuration"
        );

        let next = match plan(current) {
            Ok(Some(next)) => {
                phases.fire(ReconcileEvent::ChangeRequired);
                next
            }
            Ok(None) => {
                phases.fire(ReconcileEvent::AlreadyConverged);
                phases.fire(ReconcileEvent::Reported);
                return Ok(ReconcileOutcome::Unchanged);
            }
            Err(e) => {
                phases.fire(ReconcileEvent::ChangeRequired);
                phases.fire(ReconcileEvent::FatalError);
                error!(attempt, "Configuration edit rejected: {}", e);
                return Err(e);
            }
        };
        phases.fire(ReconcileEvent::Mutated);

        info!(attempt, version = next.version, "Submitting replica set reconfiguration");
        let failure = match ctx
            .client
            .run_command(&AdminCommand::ReplSetReconfig(next))
            .await
        {
            Ok(_) => {
                phases.fire(ReconcileEvent::Accepted);
                info!(attempt, "Reconfiguration accepted");
                return Ok(ReconcileOutcome::Changed);
            }
            Err(ClientError::AutoReconnect(reason)) => {
                phases.fire(ReconcileEvent::ConnectionReset);
                warn!(
                    attempt,
                    "Connection reset during reconfiguration ({}), outcome unconfirmed", reason
                );
                return Ok(ReconcileOutcome::Unconfirmed);
            }
            Err(e) => Error::from_submission(e),
        };

        if !failure.is_retryable() {
            phases.fire(ReconcileEvent::FatalError);
            error!(attempt, "Reconfiguration failed: {}", failure);
            return Err(failure);
        }
        phases.fire(ReconcileEvent::TransientRejection);

        let delay = backoff.delay_for_error(&failure);
        let out_of_time = policy
            .deadline()
            .is_some_and(|deadline| started.elapsed() + delay >= deadline);

        if attempt >= policy.max_attempts || out_of_time {
            phases.fire(ReconcileEvent::FatalError);
            error!(attempt, "Retry budget exhausted: {}", failure);
            return Err(Error::RetriesExhausted {
                attempts: attempt,
                last_error: failure.to_string(),
            });
        }

        warn!(
            attempt,
            "Transient reconfiguration failure: {}, retrying in {:?}", failure, delay
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        phases.fire(ReconcileEvent::RetryScheduled);
    }
}
