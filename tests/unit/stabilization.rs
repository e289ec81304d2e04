//! Unit tests for the wait-for-primary poll loop

use std::time::Duration;

use tokio::time::Instant;

use replset_reconciler::config::StabilizationConfig;
use replset_reconciler::controller::{Error, wait_for_primary};
use replset_reconciler::document::MemberState;

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_returns_once_primary() {
    let cluster = FakeCluster::fresh();
    cluster.script_statuses([
        status(0.0, MemberState::Startup),
        status(1.0, MemberState::Startup2),
        status(1.0, MemberState::Primary),
    ]);

    let started = Instant::now();
    wait_for_primary(&cluster, &StabilizationConfig::default())
        .await
        .unwrap();

    assert_eq!(cluster.status_polls(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_primary_on_first_poll_does_not_sleep() {
    let cluster = FakeCluster::fresh();

    let started = Instant::now();
    wait_for_primary(&cluster, &StabilizationConfig::default())
        .await
        .unwrap();

    assert_eq!(cluster.status_polls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_ok_without_primary_is_not_enough() {
    let cluster = FakeCluster::fresh();
    cluster.set_default_status(status(1.0, MemberState::Secondary));

    let result = wait_for_primary(
        &cluster,
        &StabilizationConfig {
            timeout_secs: 5,
            ..Default::default()
        },
    )
    .await;

    assert!(matches!(result, Err(Error::StabilizationTimeout { polls: 5 })));
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_is_sixty_polls() {
    let cluster = FakeCluster::fresh();
    cluster.set_default_status(status(0.0, MemberState::Startup));

    let started = Instant::now();
    let result = wait_for_primary(&cluster, &StabilizationConfig::default()).await;

    assert!(matches!(result, Err(Error::StabilizationTimeout { polls: 60 })));
    assert_eq!(cluster.status_polls(), 60);
    assert_eq!(started.elapsed(), Duration::from_secs(59));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_distinct_from_cluster_errors() {
    let err = Error::StabilizationTimeout { polls: 60 };
    assert!(err.code().is_none());
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("timeout"));
}
