use crate::supervisor::RunState;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("worker count must be greater than zero")]
    ZeroWorkers,

    #[error("{name} buffer must hold at least one item")]
    ZeroBuffer { name: String },
}

/// A broken conservation invariant. Never retried: it means the pipeline itself is wrong.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationError {
    #[error("sums differ: generated {generated} != collected {collected}")]
    SumMismatch { generated: i64, collected: i64 },

    #[error("counts differ: generated {generated} != collected {collected}")]
    CountMismatch { generated: u64, collected: u64 },

    #[error("per-branch counts {branches:?} do not add up to {generated} generated items")]
    BranchAccountingMismatch { generated: u64, branches: Vec<u64> },

    #[error("expected {expected} branch counters, found {actual}")]
    BranchCountMismatch { expected: usize, actual: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("{stage} task failed")]
    TaskFailed {
        stage: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("illegal run state transition {from:?} -> {to:?}")]
    InvalidTransition { from: RunState, to: RunState },
}
