pub mod collector;
pub mod worker_pool;

pub use collector::{BranchReader, Collector, CollectorHandle};
pub use worker_pool::{PoolHandle, WorkerPool};
