use crate::pipeline::{PipelineComponent, ComponentContext, PipelineTask};
use crate::pipeline::channel::{self, Receiver, Sender};
use tracing::debug;

/// A finite source emitting `1..=count`, then closing its output.
pub struct NumberSource {
    count: i64,
}

impl NumberSource {
    pub fn new(count: i64) -> Self {
        NumberSource { count }
    }

    /// Deploys the source on its own task and returns the receiving end of a
    /// conduit with the given capacity.
    pub fn spawn(self, capacity: usize) -> Receiver<i64> {
        let (tx, rx) = channel::bounded(capacity);
        let (_, input) = channel::bounded(1);
        PipelineTask::new("number source", self).deploy(vec![input], vec![tx]);
        rx
    }
}

impl PipelineComponent for NumberSource {
    type Input = ();
    type Output = i64;
    type Summary = u64;

    async fn run(&self, _input: Receiver<Self::Input>, output: Sender<Self::Output>, _context: ComponentContext) -> u64 {
        debug!("NumberSource starting");
        let mut sent = 0;
        for i in 1..=self.count {
            if output.send_payload(i).await.is_err() {
                debug!("NumberSource failed to send {}", i);
                break;
            }
            sent += 1;
        }
        output.close();
        debug!("NumberSource completed");
        sent
    }
}
