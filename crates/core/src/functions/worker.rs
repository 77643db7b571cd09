use crate::pipeline::{PipelineComponent, ComponentContext};
use crate::pipeline::{Receiver, Sender};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, error};

/// Relays items one at a time from its input to its output, pausing
/// `per_item_delay` after each one to simulate processing.
pub struct Worker<T> {
    per_item_delay: Duration,
    _phantom: PhantomData<fn(T) -> T>,
}

impl<T> Worker<T> {
    pub fn new(per_item_delay: Duration) -> Self {
        Worker {
            per_item_delay,
            _phantom: PhantomData,
        }
    }
}

impl<T: Send + 'static> PipelineComponent for Worker<T> {
    type Input = T;
    type Output = T;
    type Summary = u64;

    async fn run(&self, input: Receiver<Self::Input>, output: Sender<Self::Output>, context: ComponentContext) -> u64 {
        debug!("Worker {} starting", context.slot);
        let mut relayed = 0;

        while let Ok(msg) = input.recv().await {
            if let Err(e) = output.send(msg).await {
                error!("Worker {} failed to relay item: {}", context.slot, e);
                break;
            }
            relayed += 1;
            tokio::time::sleep(self.per_item_delay).await;
        }

        output.close();
        debug!("Worker {} completed after {} items", context.slot, relayed);
        relayed
    }
}
