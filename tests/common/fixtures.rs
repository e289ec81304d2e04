//! Test fixtures: an in-memory replica set behind [`ReplicaSetClient`]
//!
//! `FakeCluster` keeps a live configuration and behaves like a server for the
//! commands the engine issues: it rejects stale versions with code 103, installs
//! accepted configs, and answers status polls from a script.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! let cluster = FakeCluster::initiated(config_with_hosts("rs0", &["a:27017"]));
//! cluster.fail_next_reconfig(109);
//! let ctx = Context::new(cluster, EngineConfig::default());
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};

use replset_reconciler::document::{
    MemberDescriptor, MemberState, ReplicaSetConfig, ReplicaSetStatus,
};
use replset_reconciler::resources::client::{
    AdminCommand, ClientError, ClientResult, ReplicaSetClient,
};

// =============================================================================
// Convenience Functions
// =============================================================================

/// Member with only id and host set
pub fn member(id: u32, host: &str) -> MemberDescriptor {
    MemberDescriptor {
        id,
        host: Some(host.to_string()),
        ..Default::default()
    }
}

/// Version-1 configuration with sequential ids for `hosts`
pub fn config_with_hosts(name: &str, hosts: &[&str]) -> ReplicaSetConfig {
    let mut config = ReplicaSetConfig::new(name);
    config.version = 1;
    config.members = hosts
        .iter()
        .enumerate()
        .map(|(i, host)| member(i as u32, host))
        .collect();
    config
}

/// Status reply with the given ok flag and state
pub fn status(ok: f64, state: MemberState) -> ReplicaSetStatus {
    ReplicaSetStatus {
        ok,
        my_state: state,
        ..Default::default()
    }
}

pub fn primary_status() -> ReplicaSetStatus {
    status(1.0, MemberState::Primary)
}

pub fn command_error(code: i32) -> ClientError {
    ClientError::Command {
        code,
        message: format!("simulated failure {}", code),
    }
}

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("replset_reconciler=debug")
        .with_test_writer()
        .try_init();
}

// =============================================================================
// FakeCluster
// =============================================================================

#[derive(Debug, Default)]
struct State {
    set_name: Option<String>,
    config: Option<ReplicaSetConfig>,
    reconfig_failures: VecDeque<ClientError>,
    initiate_failure: Option<ClientError>,
    config_failure: Option<ClientError>,
    statuses: VecDeque<ReplicaSetStatus>,
    default_status: ReplicaSetStatus,
    requires_auth: bool,
    accepted_credentials: Option<(String, String)>,
    authenticated: bool,
    commands: Vec<AdminCommand>,
    status_polls: u32,
}

/// In-memory replica set
#[derive(Debug, Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    /// Server that is not part of any replica set yet
    pub fn fresh() -> Self {
        let cluster = Self::default();
        cluster.state.lock().unwrap().default_status = primary_status();
        cluster
    }

    /// Server belonging to an initiated set with `config` installed
    pub fn initiated(config: ReplicaSetConfig) -> Self {
        let cluster = Self::fresh();
        {
            let mut state = cluster.state.lock().unwrap();
            state.set_name = Some(config.identifier.clone());
            state.config = Some(config);
        }
        cluster
    }

    /// Reject the next reconfiguration with `code`
    pub fn fail_next_reconfig(&self, code: i32) {
        self.fail_next_reconfig_with(command_error(code));
    }

    pub fn fail_next_reconfig_with(&self, error: ClientError) {
        self.state.lock().unwrap().reconfig_failures.push_back(error);
    }

    pub fn fail_initiate(&self, error: ClientError) {
        self.state.lock().unwrap().initiate_failure = Some(error);
    }

    pub fn fail_config_read(&self, error: ClientError) {
        self.state.lock().unwrap().config_failure = Some(error);
    }

    /// Status replies returned before falling back to the default status
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = ReplicaSetStatus>) {
        self.state.lock().unwrap().statuses.extend(statuses);
    }

    pub fn set_default_status(&self, status: ReplicaSetStatus) {
        self.state.lock().unwrap().default_status = status;
    }

    /// Require authentication with the given credentials
    pub fn require_auth(&self, user: &str, password: &str) {
        let mut state = self.state.lock().unwrap();
        state.requires_auth = true;
        state.accepted_credentials = Some((user.to_string(), password.to_string()));
    }

    /// Simulate another agent installing a newer config behind our back
    pub fn bump_version_externally(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(config) = state.config.as_mut() {
            config.version += 1;
        }
    }

    pub fn live_config(&self) -> Option<ReplicaSetConfig> {
        self.state.lock().unwrap().config.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().authenticated
    }

    pub fn status_polls(&self) -> u32 {
        self.state.lock().unwrap().status_polls
    }

    /// Names of all commands received, in order
    pub fn command_names(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .map(AdminCommand::name)
            .collect()
    }

    /// Configurations submitted with `replSetReconfig`, accepted or not
    pub fn submitted_configs(&self) -> Vec<ReplicaSetConfig> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .filter_map(|c| match c {
                AdminCommand::ReplSetReconfig(config) => Some(config.clone()),
                _ => None,
            })
            .collect()
    }

    /// Configuration passed to `replSetInitiate`, if any
    pub fn initiate_argument(&self) -> Option<Option<ReplicaSetConfig>> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .find_map(|c| match c {
                AdminCommand::ReplSetInitiate(config) => Some(config.clone()),
                _ => None,
            })
    }
}

impl ReplicaSetClient for FakeCluster {
    async fn run_command(&self, command: &AdminCommand) -> ClientResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.clone());

        match command {
            AdminCommand::IsMaster => Ok(match &state.set_name {
                Some(name) => json!({"ismaster": true, "setName": name, "ok": 1}),
                None => json!({"ismaster": true, "ok": 1}),
            }),
            AdminCommand::ReplSetInitiate(config) => {
                if let Some(error) = state.initiate_failure.take() {
                    return Err(error);
                }
                let mut installed = config
                    .clone()
                    .unwrap_or_else(|| config_with_hosts("rs0", &["localhost:27017"]));
                installed.version = installed.version.max(1);
                state.set_name = Some(installed.identifier.clone());
                state.config = Some(installed);
                Ok(json!({"ok": 1}))
            }
            AdminCommand::ReplSetReconfig(config) => {
                if let Some(error) = state.reconfig_failures.pop_front() {
                    return Err(error);
                }
                let live_version = state.config.as_ref().map_or(0, |c| c.version);
                if config.version <= live_version {
                    return Err(ClientError::Command {
                        code: 103,
                        message: format!(
                            "version {} must be greater than {}",
                            config.version, live_version
                        ),
                    });
                }
                state.config = Some(config.clone());
                Ok(json!({"ok": 1}))
            }
        }
    }

    async fn fetch_config(&self) -> ClientResult<ReplicaSetConfig> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.config_failure.take() {
            return Err(error);
        }
        state
            .config
            .clone()
            .ok_or_else(|| command_error(94))
    }

    async fn fetch_status(&self) -> ClientResult<ReplicaSetStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_polls += 1;
        let default = state.default_status.clone();
        Ok(state.statuses.pop_front().unwrap_or(default))
    }

    async fn list_database_names(&self) -> ClientResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.requires_auth && !state.authenticated {
            return Err(ClientError::Command {
                code: 13,
                message: "command listDatabases requires authentication".into(),
            });
        }
        Ok(vec!["admin".into(), "local".into()])
    }

    async fn authenticate(&self, user: &str, password: &str) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        let accepted = state
            .accepted_credentials
            .as_ref()
            .is_some_and(|(u, p)| u == user && p == password);
        if !accepted {
            return Err(ClientError::Command {
                code: 18,
                message: "Authentication failed.".into(),
            });
        }
        state.authenticated = true;
        Ok(())
    }
}
