use crate::config::EngineConfig;
use crate::resources::client::ReplicaSetClient;

/// Shared context for one invocation
pub struct Context<C: ReplicaSetClient> {
    /// Connected client handle
    pub client: C,
    pub config: EngineConfig,
}

impl<C: ReplicaSetClient> Context<C> {
    pub fn new(client: C, config: EngineConfig) -> Self {
        Self { client, config }
    }
}
