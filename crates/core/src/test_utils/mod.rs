mod number_source;
mod recording_sink;

pub use number_source::NumberSource;
pub use recording_sink::{Record, RecordingSink};
