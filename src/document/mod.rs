pub mod replica_set;
pub mod request;
pub mod status;

pub use replica_set::{
    MemberDescriptor, ReplicaSetConfig, SettingsBlock, WriteConcernDefaults, WriteConcernMode,
};
pub use request::{DesiredState, ReplicaSetRequest, request_schema};
pub use status::{HelloResponse, MemberState, ReplicaSetStatus};
