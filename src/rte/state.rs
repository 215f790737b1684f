//! RTE lifecycle state machine

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum RteState {
    #[default]
    NotInitialized,
    Initialized,
    Terminated,
}

/// API methods that are gated by the lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RteCall {
    Initialize,
    Terminate,
    GetValue,
    SetValue,
    Commit,
}

/// Why a call was refused in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Refusal {
    NotInitialized,
    AlreadyInitialized,
    AlreadyTerminated,
}

impl RteState {
    /// Guarded transition table
    ///
    /// Returns the state after `call` succeeds, or the refusal. Data calls
    /// leave the state unchanged; nothing leaves `Terminated`.
    pub fn apply(self, call: RteCall) -> Result<RteState, Refusal> {
        use RteCall::*;
        use RteState::*;

        match (self, call) {
            (NotInitialized, Initialize) => Ok(Initialized),
            (NotInitialized, _) => Err(Refusal::NotInitialized),
            (Initialized, Initialize) => Err(Refusal::AlreadyInitialized),
            (Initialized, Terminate) => Ok(Terminated),
            (Initialized, GetValue | SetValue | Commit) => Ok(Initialized),
            (Terminated, _) => Err(Refusal::AlreadyTerminated),
        }
    }

    pub fn is_running(self) -> bool {
        self == RteState::Initialized
    }
}
