// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for the configuration document model and validation
//!
//! These tests use proptest to generate random configurations and verify that:
//! 1. Added members always receive an id above every existing id
//! 2. Every edit bumps the version by exactly one
//! 3. Membership lookup is exact and side-effect free
//! 4. The state machine never panics on any event sequence
//! 5. Validation is deterministic (same input = same output)

use proptest::prelude::*;

use replset_reconciler::controller::state_machine::{
    PhaseTracker, ReconcileEvent, ReconcilePhase, ReconcileStateMachine,
};
use replset_reconciler::controller::validate_request;
use replset_reconciler::document::{
    DesiredState, MemberDescriptor, ReplicaSetConfig, ReplicaSetRequest,
};
use replset_reconciler::resources::common::normalize_host;
use replset_reconciler::resources::settings::{SettingsOptions, build_settings};

// =============================================================================
// Strategy generators
// =============================================================================

/// Generate a DNS-style host name without a port
fn host_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(\\.[a-z]{2,5}){0,2}"
}

/// Generate a live configuration with unique hosts and unique, possibly sparse ids
fn live_config() -> impl Strategy<Value = ReplicaSetConfig> {
    (
        prop::collection::btree_set(0u32..64, 0..7),
        prop::collection::btree_set(host_name(), 7),
        1u64..1000,
    )
        .prop_map(|(ids, hosts, version)| {
            let mut config = ReplicaSetConfig::new("rs0");
            config.version = version;
            config.members = ids
                .into_iter()
                .zip(hosts)
                .map(|(id, host)| MemberDescriptor {
                    id,
                    host: Some(normalize_host(&host)),
                    ..Default::default()
                })
                .collect();
            config
        })
}

fn any_event() -> impl Strategy<Value = ReconcileEvent> {
    prop_oneof![
        Just(ReconcileEvent::ConfigRead),
        Just(ReconcileEvent::AlreadyConverged),
        Just(ReconcileEvent::ChangeRequired),
        Just(ReconcileEvent::Mutated),
        Just(ReconcileEvent::Accepted),
        Just(ReconcileEvent::ConnectionReset),
        Just(ReconcileEvent::TransientRejection),
        Just(ReconcileEvent::RetryScheduled),
        Just(ReconcileEvent::FatalError),
        Just(ReconcileEvent::Reported),
    ]
}

fn any_state() -> impl Strategy<Value = DesiredState> {
    prop_oneof![
        Just(DesiredState::Initiated),
        Just(DesiredState::Reconf),
        Just(DesiredState::Present),
        Just(DesiredState::Absent),
    ]
}

// =============================================================================
// Document model properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn added_member_id_exceeds_existing(config in live_config(), host in host_name()) {
        let host = format!("new-{}", normalize_host(&host));
        let mut next = config.clone();
        let id = next.next_member_id();
        next.add_member(MemberDescriptor {
            id,
            host: Some(host.clone()),
            ..Default::default()
        }).unwrap();

        prop_assert!(config.members.iter().all(|m| m.id < id));
        prop_assert_eq!(next.version, config.version + 1);
        prop_assert_eq!(next.members.len(), config.members.len() + 1);
        prop_assert!(next.find_member(&host).is_some());
    }

    #[test]
    fn remove_bumps_version_once(config in live_config(), pick in any::<prop::sample::Index>()) {
        let mut next = config.clone();
        let host = if config.members.is_empty() {
            "absent.example.com:27017".to_string()
        } else {
            config.members[pick.index(config.members.len())].host.clone().unwrap()
        };
        let matched = next.remove_member(&host);

        prop_assert_eq!(matched, !config.members.is_empty());
        prop_assert_eq!(next.version, config.version + 1);
        prop_assert!(next.find_member(&host).is_none());
    }

    #[test]
    fn find_member_does_not_modify(config in live_config(), host in host_name()) {
        let before = config.clone();
        let _ = config.find_member(&normalize_host(&host));
        prop_assert_eq!(config, before);
    }

    #[test]
    fn normalized_host_always_has_port(host in host_name()) {
        let normalized = normalize_host(&host);
        prop_assert!(normalized.ends_with(":27017"));
        prop_assert_eq!(normalize_host(&normalized), normalized);
    }

    #[test]
    fn replace_settings_bumps_version_once(config in live_config(), heartbeat in 0i64..120) {
        let mut next = config.clone();
        next.replace_settings(build_settings(&SettingsOptions {
            heartbeat_secs: Some(heartbeat),
            ..Default::default()
        }));
        prop_assert_eq!(next.version, config.version + 1);
        prop_assert_eq!(next.members, config.members);
    }
}

// =============================================================================
// State machine and validation properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn state_machine_never_leaves_terminal(events in prop::collection::vec(any_event(), 0..30)) {
        let sm = ReconcileStateMachine::new();
        let mut tracker = PhaseTracker::new(&sm);
        let mut terminal: Option<ReconcilePhase> = None;

        for event in events {
            tracker.fire(event);
            if let Some(phase) = terminal {
                prop_assert_eq!(tracker.current(), phase);
            } else if tracker.current().is_terminal() {
                terminal = Some(tracker.current());
            }
        }
    }

    #[test]
    fn validation_is_deterministic(
        state in any_state(),
        member in prop::option::of(host_name()),
        priority in -2.0f64..5.0,
        votes in -1i32..3,
    ) {
        let mut request = ReplicaSetRequest::new(state);
        request.member = member;
        request.priority = priority;
        request.votes = votes;

        let first = validate_request(&request);
        let second = validate_request(&request);
        prop_assert_eq!(first.is_ok(), second.is_ok());
    }

    #[test]
    fn membership_states_require_member(
        state in prop_oneof![Just(DesiredState::Present), Just(DesiredState::Absent)],
    ) {
        let request = ReplicaSetRequest::new(state);
        prop_assert!(validate_request(&request).is_err());
    }
}
