use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);
pub const DEFAULT_PER_ITEM_DELAY: Duration = Duration::from_millis(1);

/// Static parameters of one pipeline run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of workers, and of per-worker output conduits.
    pub workers: usize,
    /// How long the generator keeps producing.
    pub deadline: Duration,
    /// Simulated processing latency a worker waits after relaying an item.
    pub per_item_delay: Duration,
    /// Capacity of the shared input conduit.
    pub input_buffer: usize,
    /// Capacity of each worker's output conduit.
    pub branch_buffer: usize,
    /// Capacity of the merged output conduit. Defaults to `workers`.
    pub merged_buffer: Option<usize>,
    /// Period of the conduit monitor; disabled when `None`.
    pub monitor_interval: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            workers: DEFAULT_WORKERS,
            deadline: DEFAULT_DEADLINE,
            per_item_delay: DEFAULT_PER_ITEM_DELAY,
            input_buffer: 1,
            branch_buffer: 1,
            merged_buffer: None,
            monitor_interval: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(workers: usize, deadline: Duration, per_item_delay: Duration) -> Self {
        PipelineConfig {
            workers,
            deadline,
            per_item_delay,
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_per_item_delay(mut self, delay: Duration) -> Self {
        self.per_item_delay = delay;
        self
    }

    pub fn with_input_buffer(mut self, capacity: usize) -> Self {
        self.input_buffer = capacity;
        self
    }

    pub fn with_branch_buffer(mut self, capacity: usize) -> Self {
        self.branch_buffer = capacity;
        self
    }

    pub fn with_merged_buffer(mut self, capacity: usize) -> Self {
        self.merged_buffer = Some(capacity);
        self
    }

    pub fn with_monitor_interval(mut self, period: Duration) -> Self {
        self.monitor_interval = Some(period);
        self
    }

    pub fn merged_capacity(&self) -> usize {
        self.merged_buffer.unwrap_or(self.workers)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        let buffers = [
            ("input", self.input_buffer),
            ("branch", self.branch_buffer),
            ("merged", self.merged_capacity()),
        ];
        for (name, capacity) in buffers {
            if capacity == 0 {
                return Err(ConfigError::ZeroBuffer { name: name.to_string() });
            }
        }
        Ok(())
    }
}
