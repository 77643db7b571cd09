use crate::error::PipelineError;
use crate::pipeline::{PipelineComponent, ComponentContext, PipelineTask};
use crate::pipeline::channel::{Receiver, Sender};
use std::marker::PhantomData;
use tracing::debug;

/// One received item and the branch that relayed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<T> {
    pub payload: T,
    pub branch: Option<usize>,
}

/// Drains a conduit and keeps everything it received, in arrival order.
pub struct RecordingSink<T> {
    records: Vec<Record<T>>,
}

struct Recorder<T> {
    _phantom: PhantomData<fn(T) -> T>,
}

impl<T: Send + 'static> PipelineComponent for Recorder<T> {
    type Input = T;
    type Output = ();
    type Summary = Vec<Record<T>>;

    async fn run(&self, input: Receiver<Self::Input>, _output: Sender<Self::Output>, _context: ComponentContext) -> Vec<Record<T>> {
        debug!("RecordingSink starting");
        let mut records = Vec::new();
        while let Ok(msg) = input.recv().await {
            records.push(Record {
                branch: msg.branch,
                payload: msg.payload,
            });
        }
        debug!("RecordingSink completed with {} records", records.len());
        records
    }
}

impl<T: Send + 'static> RecordingSink<T> {
    /// Receives until `input` is closed and drained.
    pub async fn drain(input: Receiver<T>) -> Result<Self, PipelineError> {
        let (null_sender, _) = crate::pipeline::channel::bounded(1);
        let recorder = Recorder { _phantom: PhantomData };
        let mut summaries = PipelineTask::new("recording sink", recorder)
            .deploy(vec![input], vec![null_sender])
            .join()
            .await?;
        Ok(RecordingSink {
            records: summaries.pop().unwrap_or_default(),
        })
    }
}

impl<T> RecordingSink<T> {
    pub fn records(&self) -> &[Record<T>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record<T>> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Payloads relayed by `branch`, in the order they arrived.
    pub fn branch_payloads(&self, branch: usize) -> Vec<&T> {
        self.records
            .iter()
            .filter(|r| r.branch == Some(branch))
            .map(|r| &r.payload)
            .collect()
    }
}
