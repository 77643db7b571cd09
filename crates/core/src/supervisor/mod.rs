//! Composition root: wires generator → shared input → worker pool → branch
//! conduits → collector → merged output, enforces the deadline, drains the
//! merged output and verifies the totals.
//!
//! Only the generator watches the deadline. Every later stage stops because
//! its input closed, so shutdown flows downstream one conduit at a time.

mod report;
mod state;
mod verify;

pub use report::RunReport;
pub use state::RunState;
pub use verify::{verify, RunTotals};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::pipeline::channel::{self, Receiver};
use crate::pipeline::{ConduitGauge, PipelineMonitor, PipelineTask};
use crate::slots::{Collector, WorkerPool};
use crate::sources::Generator;
use crate::tally::InputTally;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct Supervisor {
    config: PipelineConfig,
    state: RunState,
}

impl Supervisor {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Supervisor {
            config,
            state: RunState::Init,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition { from: self.state, to: next });
        }
        info!("Run state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the pipeline once.
    ///
    /// A broken invariant is not an `Err` here: it is recorded in the report
    /// (state `Failed`) so the caller can print the totals before bailing out
    /// with [`RunReport::ensure_ok`]. `Err` means a stage task failed or the
    /// supervisor was already used.
    pub async fn run(&mut self) -> Result<RunReport, PipelineError> {
        let result = self.execute().await;
        if result.is_err() && !self.state.is_terminal() {
            self.state = RunState::Failed;
        }
        result
    }

    async fn execute(&mut self) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        self.transition(RunState::Running)?;

        let token = CancellationToken::new();
        let timer = {
            let token = token.clone();
            let deadline = self.config.deadline;
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                debug!("Deadline of {:?} reached", deadline);
                token.cancel();
            })
        };

        let tally = Arc::new(InputTally::new());
        let observer_tally = Arc::clone(&tally);
        let (input_tx, input_rx) = channel::bounded(self.config.input_buffer);
        let (_, source_input) = channel::bounded(1);
        let generator = PipelineTask::new(
            "generator",
            Generator::new(token.clone(), move |value| observer_tally.record(value)),
        )
        .deploy(vec![source_input], vec![input_tx]);

        let mut monitor = self.config.monitor_interval.map(|_| PipelineMonitor::new());
        if let Some(monitor) = monitor.as_mut() {
            monitor.register_monitor(Arc::new(ConduitGauge::new("input", &input_rx)));
        }

        let pool = WorkerPool::spawn(&self.config, input_rx);
        if let Some(monitor) = monitor.as_mut() {
            for (branch, output) in pool.outputs().iter().enumerate() {
                monitor.register_monitor(Arc::new(ConduitGauge::new(format!("branch-{}", branch), output)));
            }
        }
        let (branches, pool_handle) = pool.into_parts();

        let (merged, collector) = Collector::spawn(branches, self.config.merged_capacity());
        if let (Some(monitor), Some(period)) = (monitor.as_mut(), self.config.monitor_interval) {
            monitor.register_monitor(Arc::new(ConduitGauge::new("merged", &merged)));
            monitor.start(period);
        }

        let (collected_sum, collected_count) = self.drain(&merged, &token).await?;
        timer.abort();

        let emitted = generator.join().await?.into_iter().sum::<u64>();
        let relayed = pool_handle.join().await?;
        let amounts = collector.join().await?;
        if let Some(monitor) = monitor.as_mut() {
            monitor.stop();
        }
        debug!("Generator emitted {} values, workers relayed {:?}", emitted, relayed);

        let totals = RunTotals {
            workers: self.config.workers,
            generated_sum: tally.sum(),
            generated_count: tally.count(),
            collected_sum,
            collected_count,
            amounts,
        };
        self.conclude(totals, relayed, started_at)
    }

    /// Moves through `Verifying` to `Ok` or `Failed` and builds the report.
    fn conclude(&mut self, totals: RunTotals, relayed: Vec<u64>, started_at: DateTime<Utc>) -> Result<RunReport, PipelineError> {
        self.transition(RunState::Verifying)?;

        let failure = verify(&totals).err();
        match &failure {
            None => {
                self.transition(RunState::Ok)?;
                info!(
                    "Verified {} items (sum {}) across {} branches",
                    totals.collected_count, totals.collected_sum, totals.workers
                );
            }
            Some(e) => {
                error!("Verification failed: {}", e);
                self.transition(RunState::Failed)?;
            }
        }

        Ok(RunReport {
            config: self.config.clone(),
            state: self.state,
            totals,
            relayed,
            started_at,
            finished_at: Utc::now(),
            failure,
        })
    }

    /// Sums the merged output until it closes, moving to `Draining` once the
    /// deadline has fired or the output has closed.
    async fn drain(&mut self, merged: &Receiver<i64>, token: &CancellationToken) -> Result<(i64, u64), PipelineError> {
        let mut sum: i64 = 0;
        let mut count: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled(), if self.state == RunState::Running => {
                    self.transition(RunState::Draining)?;
                }
                msg = merged.recv() => match msg {
                    Ok(msg) => {
                        sum += msg.payload;
                        count += 1;
                    }
                    Err(_) => break,
                },
            }
        }

        if self.state == RunState::Running {
            self.transition(RunState::Draining)?;
        }
        Ok((sum, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerificationError;

    fn drained_supervisor() -> Supervisor {
        let mut supervisor = Supervisor::new(PipelineConfig::default().with_workers(2)).unwrap();
        supervisor.state = RunState::Draining;
        supervisor
    }

    #[test]
    fn tampered_totals_fail_the_run() {
        let mut supervisor = drained_supervisor();
        let totals = RunTotals {
            workers: 2,
            generated_sum: 21,
            generated_count: 6,
            collected_sum: 20,
            collected_count: 6,
            amounts: vec![3, 3],
        };

        let report = supervisor.conclude(totals, vec![3, 3], Utc::now()).unwrap();
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(supervisor.state(), RunState::Failed);
        assert!(!report.is_ok());

        let text = report.to_string();
        assert!(text.contains("Sum (generated, collected): 21 20"));
        assert!(text.ends_with("State: FAILED (sums differ: generated 21 != collected 20)"));

        match report.ensure_ok() {
            Err(PipelineError::Verification(e)) => {
                assert_eq!(e, VerificationError::SumMismatch { generated: 21, collected: 20 });
            }
            other => panic!("expected a verification error, got {:?}", other.map(|r| r.state)),
        }
    }

    #[test]
    fn matching_totals_pass_the_run() {
        let mut supervisor = drained_supervisor();
        let totals = RunTotals {
            workers: 2,
            generated_sum: 21,
            generated_count: 6,
            collected_sum: 21,
            collected_count: 6,
            amounts: vec![4, 2],
        };

        let report = supervisor.conclude(totals, vec![4, 2], Utc::now()).unwrap();
        assert_eq!(supervisor.state(), RunState::Ok);
        assert!(report.ensure_ok().is_ok());
    }

    #[test]
    fn conclude_requires_a_drained_run() {
        let mut supervisor = Supervisor::new(PipelineConfig::default()).unwrap();
        let result = supervisor.conclude(RunTotals::default(), Vec::new(), Utc::now());
        assert!(matches!(
            result,
            Err(PipelineError::InvalidTransition { from: RunState::Init, to: RunState::Verifying })
        ));
    }
}
