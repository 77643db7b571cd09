use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one pipeline run.
///
/// `Init → Running → Draining → Verifying → Ok | Failed`. A run that hits an
/// infrastructure error (a stage task panicking) moves to `Failed` from
/// wherever it was. `Ok` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    Init,
    Running,
    Draining,
    Verifying,
    Ok,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Ok | RunState::Failed)
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Init, Running) | (Running, Draining) | (Draining, Verifying) | (Verifying, Ok) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::Running => "RUNNING",
            RunState::Draining => "DRAINING",
            RunState::Verifying => "VERIFYING",
            RunState::Ok => "OK",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}
