//! Replica-set reconfiguration reconciler
//!
//! Converges the membership and settings of a replica set to a declared desired
//! state, one member change or one settings change per invocation. The engine
//! reads the live configuration, computes the next version, submits it and
//! retries on transient rejections; initiation waits for a primary to emerge.
//!
//! The data store is reached through [`ReplicaSetClient`]; connection setup and
//! wire encoding belong to the implementor.

pub mod config;
pub mod controller;
pub mod document;
pub mod resources;

pub use config::{EngineConfig, RetryPolicy, StabilizationConfig};
pub use controller::{
    Context, Error, Membership, ReconcileOutcome, Result, RunReport, initiate, reconcile_member,
    reconcile_settings, run, wait_for_primary,
};
pub use document::{
    DesiredState, MemberDescriptor, ReplicaSetConfig, ReplicaSetRequest, ReplicaSetStatus,
    SettingsBlock,
};
pub use resources::{AdminCommand, ClientError, ReplicaSetClient};
