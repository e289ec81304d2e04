pub mod bootstrap;
pub mod context;
pub mod error;
pub mod reconciler;
pub mod stabilization;
pub mod state_machine;
pub mod validation;

pub use bootstrap::{initial_config, initiate};
pub use context::Context;
pub use error::{BackoffConfig, Error, Result};
pub use reconciler::{
    Membership, ReconcileOutcome, RunReport, reconcile_member, reconcile_settings, run,
};
pub use stabilization::wait_for_primary;
pub use validation::validate_request;
