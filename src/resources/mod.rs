pub mod client;
pub mod common;
pub mod member;
pub mod settings;

pub use client::{
    AdminCommand, ClientError, ClientResult, ReplicaSetClient, authenticate_if_required,
};
pub use common::{DEFAULT_PORT, normalize_host};
pub use member::{MemberOptions, build_member};
pub use settings::{SettingsOptions, build_settings};
