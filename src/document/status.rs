use serde::{Deserialize, Serialize};

/// Member state codes reported by `replSetGetStatus`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(from = "i32", into = "i32")]
pub enum MemberState {
    #[default]
    Startup,
    Primary,
    Secondary,
    Recovering,
    Startup2,
    Unknown,
    Arbiter,
    Down,
    Rollback,
    Removed,
    Other(i32),
}

impl From<i32> for MemberState {
    fn from(code: i32) -> Self {
        match code {
            0 => MemberState::Startup,
            1 => MemberState::Primary,
            2 => MemberState::Secondary,
            3 => MemberState::Recovering,
            5 => MemberState::Startup2,
            6 => MemberState::Unknown,
            7 => MemberState::Arbiter,
            8 => MemberState::Down,
            9 => MemberState::Rollback,
            10 => MemberState::Removed,
            other => MemberState::Other(other),
        }
    }
}

impl From<MemberState> for i32 {
    fn from(state: MemberState) -> Self {
        match state {
            MemberState::Startup => 0,
            MemberState::Primary => 1,
            MemberState::Secondary => 2,
            MemberState::Recovering => 3,
            MemberState::Startup2 => 5,
            MemberState::Unknown => 6,
            MemberState::Arbiter => 7,
            MemberState::Down => 8,
            MemberState::Rollback => 9,
            MemberState::Removed => 10,
            MemberState::Other(code) => code,
        }
    }
}

/// Subset of the `replSetGetStatus` reply the stabilization waiter inspects.
///
/// Fetched without raising on non-ok replies, so `ok` may be 0 with an `errmsg`
/// while the set is still electing.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSetStatus {
    #[serde(default)]
    pub ok: f64,

    #[serde(default)]
    pub my_state: MemberState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errmsg: Option<String>,
}

impl ReplicaSetStatus {
    /// The set reports ok and the member we are talking to is primary
    pub fn is_ok_primary(&self) -> bool {
        self.ok == 1.0 && self.my_state == MemberState::Primary
    }
}

/// Subset of the `isMaster` reply used to detect an initiated set
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelloResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,

    #[serde(default)]
    pub ismaster: bool,

    #[serde(default)]
    pub secondary: bool,
}

impl HelloResponse {
    pub fn is_initiated(&self) -> bool {
        self.set_name.is_some()
    }
}
