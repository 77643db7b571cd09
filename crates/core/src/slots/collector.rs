use crate::error::PipelineError;
use crate::pipeline::channel::{self, Receiver, Sender};
use crate::pipeline::{ComponentContext, PipelineComponent, PipelineTask};
use std::marker::PhantomData;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Forwards one branch into the shared merged conduit and counts what it forwarded.
///
/// It never closes the merged conduit; other branches may still be writing.
pub struct BranchReader<T> {
    _phantom: PhantomData<fn(T) -> T>,
}

impl<T> BranchReader<T> {
    pub fn new() -> Self {
        BranchReader {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for BranchReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> PipelineComponent for BranchReader<T> {
    type Input = T;
    type Output = T;
    type Summary = u64;

    async fn run(&self, input: Receiver<Self::Input>, output: Sender<Self::Output>, context: ComponentContext) -> u64 {
        debug!("BranchReader {} starting", context.slot);
        let mut amount = 0;

        while let Ok(item) = input.recv().await {
            if let Err(e) = output.send(item).await {
                error!("BranchReader {} failed to forward item: {}", context.slot, e);
                break;
            }
            amount += 1;
        }

        debug!("BranchReader {} completed after {} items", context.slot, amount);
        amount
    }
}

/// Fan-in: merges N branch conduits into one.
///
/// One [`BranchReader`] runs per branch. A barrier task joins all of them and
/// only then closes the merged conduit, so the merged stream ends exactly
/// when every branch is exhausted.
pub struct Collector;

/// Completion handle for a [`Collector`]'s barrier.
pub struct CollectorHandle {
    barrier: JoinHandle<Result<Vec<u64>, PipelineError>>,
}

impl Collector {
    /// Starts the readers and the closing barrier; returns the merged conduit.
    pub fn spawn<T: Send + 'static>(branches: Vec<Receiver<T>>, merged_capacity: usize) -> (Receiver<T>, CollectorHandle) {
        let slots = branches.len();
        debug!("Creating collector over {} branches", slots);

        let (merged_tx, merged_rx) = channel::bounded(merged_capacity);
        let readers = PipelineTask::with_slots("collector", BranchReader::new(), slots)
            .deploy(branches, vec![merged_tx.clone(); slots]);

        let barrier = tokio::spawn(async move {
            let amounts = readers.join().await;
            // Close even if a reader failed so the consumer is never left waiting.
            merged_tx.close();
            debug!("Collector barrier passed, merged output closed");
            amounts
        });

        (merged_rx, CollectorHandle { barrier })
    }
}

impl CollectorHandle {
    /// Returns the per-branch amounts, indexed by branch.
    pub async fn join(self) -> Result<Vec<u64>, PipelineError> {
        match self.barrier.await {
            Ok(amounts) => amounts,
            Err(e) => Err(PipelineError::TaskFailed { stage: "collector barrier", source: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merges_branches_and_counts_per_branch() {
        let mut branches = Vec::new();
        let mut senders = Vec::new();
        for branch in 0..3 {
            let (tx, rx) = channel::for_branch::<i64>(branch, 2);
            senders.push(tx);
            branches.push(rx);
        }

        let (merged, handle) = Collector::spawn(branches, 3);

        let feeders: Vec<_> = senders
            .into_iter()
            .enumerate()
            .map(|(branch, tx)| {
                tokio::spawn(async move {
                    for i in 0..(branch as i64 + 1) * 4 {
                        tx.send_payload(branch as i64 * 100 + i).await.unwrap();
                    }
                    tx.close();
                })
            })
            .collect();

        let mut per_branch = vec![Vec::new(); 3];
        while let Ok(msg) = merged.recv().await {
            let branch = msg.branch.unwrap();
            per_branch[branch].push(msg.payload);
        }
        for feeder in feeders {
            feeder.await.unwrap();
        }

        assert_eq!(handle.join().await.unwrap(), vec![4, 8, 12]);
        for (branch, values) in per_branch.iter().enumerate() {
            let expected: Vec<i64> = (0..(branch as i64 + 1) * 4).map(|i| branch as i64 * 100 + i).collect();
            assert_eq!(*values, expected);
        }
    }

    #[tokio::test]
    async fn merged_stays_open_until_every_branch_closes() {
        let (fast_tx, fast_rx) = channel::for_branch::<i64>(0, 1);
        let (slow_tx, slow_rx) = channel::for_branch::<i64>(1, 1);
        let (merged, handle) = Collector::spawn(vec![fast_rx, slow_rx], 2);

        fast_tx.close();
        tokio::task::yield_now().await;
        assert!(!merged.is_closed());

        slow_tx.send_payload(7).await.unwrap();
        slow_tx.close();

        let msg = merged.recv().await.unwrap();
        assert_eq!((msg.payload, msg.branch), (7, Some(1)));
        assert!(merged.recv().await.is_err());
        assert_eq!(handle.join().await.unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn no_branches_closes_immediately() {
        let (merged, handle) = Collector::spawn(Vec::<Receiver<i64>>::new(), 1);
        assert!(merged.recv().await.is_err());
        assert!(handle.join().await.unwrap().is_empty());
    }
}
