//! Wait for the replica set to settle on a primary
//!
//! The data store pushes no notification when an election completes, so the
//! waiter polls `replSetGetStatus` on a fixed interval.

use tracing::{debug, info, instrument};

use crate::config::StabilizationConfig;
use crate::controller::error::{Error, Result};
use crate::resources::client::ReplicaSetClient;

/// Poll until the set reports ok with the connected member as primary.
///
/// Every unsuccessful poll consumes one unit of `timeout_secs`; when the budget
/// reaches zero the wait fails with [`Error::StabilizationTimeout`].
#[instrument(skip(client, config), fields(timeout = config.timeout_secs))]
pub async fn wait_for_primary<C: ReplicaSetClient>(
    client: &C,
    config: &StabilizationConfig,
) -> Result<()> {
    let mut remaining = config.timeout_secs;
    let mut polls = 0u32;

    loop {
        let status = client.fetch_status().await?;
        polls += 1;

        if status.is_ok_primary() {
            info!(polls, "Replica set is ok with a primary");
            return Ok(());
        }

        debug!(
            ok = status.ok,
            my_state = ?status.my_state,
            errmsg = status.errmsg.as_deref().unwrap_or(""),
            "Replica set not stable yet"
        );

        remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            return Err(Error::StabilizationTimeout { polls });
        }

        tokio::time::sleep(config.poll_interval()).await;
    }
}
