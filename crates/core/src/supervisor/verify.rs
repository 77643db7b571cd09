use crate::error::VerificationError;
use serde::{Deserialize, Serialize};

/// Counters captured at the end of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub workers: usize,
    pub generated_sum: i64,
    pub generated_count: u64,
    pub collected_sum: i64,
    pub collected_count: u64,
    /// Items forwarded by each branch of the collector, indexed by worker.
    pub amounts: Vec<u64>,
}

/// Checks that nothing was lost, duplicated or altered between the generator
/// and the merged output.
///
/// Pure over `totals`: checking the same snapshot twice gives the same answer.
pub fn verify(totals: &RunTotals) -> Result<(), VerificationError> {
    if totals.generated_sum != totals.collected_sum {
        return Err(VerificationError::SumMismatch {
            generated: totals.generated_sum,
            collected: totals.collected_sum,
        });
    }
    if totals.generated_count != totals.collected_count {
        return Err(VerificationError::CountMismatch {
            generated: totals.generated_count,
            collected: totals.collected_count,
        });
    }
    if totals.amounts.len() != totals.workers {
        return Err(VerificationError::BranchCountMismatch {
            expected: totals.workers,
            actual: totals.amounts.len(),
        });
    }
    if totals.amounts.iter().sum::<u64>() != totals.generated_count {
        return Err(VerificationError::BranchAccountingMismatch {
            generated: totals.generated_count,
            branches: totals.amounts.clone(),
        });
    }
    Ok(())
}
