use super::state::RunState;
use super::verify::RunTotals;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, VerificationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one supervised run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub config: PipelineConfig,
    pub state: RunState,
    pub totals: RunTotals,
    /// Items each worker relayed, indexed by worker.
    pub relayed: Vec<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failure: Option<VerificationError>,
}

impl RunReport {
    pub fn is_ok(&self) -> bool {
        self.state == RunState::Ok
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Turns a failed verification into an error, keeping the report otherwise.
    pub fn ensure_ok(self) -> Result<Self, PipelineError> {
        match self.failure {
            Some(e) => Err(PipelineError::Verification(e)),
            None => Ok(self),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Count (generated, collected): {} {}", self.totals.generated_count, self.totals.collected_count)?;
        writeln!(f, "Sum (generated, collected): {} {}", self.totals.generated_sum, self.totals.collected_sum)?;
        writeln!(f, "Per-branch amounts: {:?}", self.totals.amounts)?;
        write!(f, "State: {}", self.state)?;
        if let Some(failure) = &self.failure {
            write!(f, " ({})", failure)?;
        }
        Ok(())
    }
}
