//! Fan-out: N workers competing for one shared input.
//!
//! Every worker holds a clone of the same input receiver, so each item is
//! delivered to exactly one of them. Which worker gets which item is up to
//! the scheduler. Each worker writes to its own branch conduit, stamped with
//! its index.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::functions::Worker;
use crate::pipeline::channel::{self, Receiver};
use crate::pipeline::{DeployedTask, PipelineTask};
use tracing::debug;

pub struct WorkerPool<T> {
    outputs: Vec<Receiver<T>>,
    handle: PoolHandle,
}

/// Completion handle for the pool's workers.
pub struct PoolHandle {
    deployed: DeployedTask<u64>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Starts `config.workers` workers reading from `input`.
    ///
    /// The pool keeps no clone of `input`; once the producer closes it and the
    /// workers drain it, every branch conduit closes.
    pub fn spawn(config: &PipelineConfig, input: Receiver<T>) -> Self {
        let workers = config.workers;
        debug!("Creating worker pool with {} workers", workers);

        let mut inputs = Vec::with_capacity(workers);
        let mut senders = Vec::with_capacity(workers);
        let mut outputs = Vec::with_capacity(workers);
        for branch in 0..workers {
            let (s, r) = channel::for_branch(branch, config.branch_buffer);
            inputs.push(input.clone());
            senders.push(s);
            outputs.push(r);
        }
        drop(input);

        let task = PipelineTask::with_slots("worker", Worker::new(config.per_item_delay), workers);
        let deployed = task.deploy(inputs, senders);

        WorkerPool {
            outputs,
            handle: PoolHandle { deployed },
        }
    }

    pub fn outputs(&self) -> &[Receiver<T>] {
        &self.outputs
    }

    pub fn into_parts(self) -> (Vec<Receiver<T>>, PoolHandle) {
        (self.outputs, self.handle)
    }
}

impl PoolHandle {
    /// Waits for every worker and returns how many items each one relayed.
    pub async fn join(self) -> Result<Vec<u64>, PipelineError> {
        self.deployed.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{NumberSource, RecordingSink};
    use std::time::Duration;

    #[tokio::test]
    async fn every_item_reaches_exactly_one_branch() {
        let config = PipelineConfig::default()
            .with_workers(3)
            .with_per_item_delay(Duration::ZERO);
        let input = NumberSource::new(30).spawn(2);
        let pool = WorkerPool::spawn(&config, input);
        assert_eq!(pool.outputs().len(), 3);

        let (outputs, handle) = pool.into_parts();
        let mut recorded = Vec::new();
        for output in outputs {
            recorded.extend(RecordingSink::drain(output).await.unwrap().into_records());
        }
        let relayed = handle.join().await.unwrap();

        assert_eq!(relayed.iter().sum::<u64>(), 30);
        let mut values: Vec<i64> = recorded.iter().map(|r| r.payload).collect();
        values.sort_unstable();
        assert_eq!(values, (1..=30).collect::<Vec<_>>());
        for (branch, count) in relayed.iter().enumerate() {
            let stamped = recorded.iter().filter(|r| r.branch == Some(branch)).count();
            assert_eq!(stamped as u64, *count);
        }
    }
}
