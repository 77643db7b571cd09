//! A deadline-bound fan-out/fan-in pipeline that checks it conserves every item.
//!
//! A [`Generator`](sources::Generator) feeds 1, 2, 3, … into a shared conduit
//! until its deadline fires. A [`WorkerPool`](slots::WorkerPool) of competing
//! workers relays them into one conduit per worker, a
//! [`Collector`](slots::Collector) merges those back into one stream, and the
//! [`Supervisor`](supervisor::Supervisor) checks that count and sum survived
//! the trip.

pub mod config;
pub mod error;
pub mod functions;
pub mod pipeline;
pub mod slots;
pub mod sources;
pub mod supervisor;
pub mod tally;
pub mod test_utils;

pub use config::PipelineConfig;
pub use error::{ConfigError, PipelineError, VerificationError};
pub use supervisor::{RunReport, RunState, RunTotals, Supervisor};
