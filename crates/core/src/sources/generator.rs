use crate::pipeline::{PipelineComponent, ComponentContext};
use crate::pipeline::channel::{Sender, Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Emits 1, 2, 3, … until its cancellation token fires.
///
/// Each value is handed to the output first and reported to the observer
/// afterwards, so accounting can lag behind a slow consumer but never skip a
/// value. The token is checked once per iteration and does not interrupt a
/// send that is already waiting: a value whose send started before the
/// deadline may still be delivered after it.
pub struct Generator {
    token: CancellationToken,
    observer: Box<dyn Fn(i64) + Send + Sync>,
}

impl Generator {
    pub fn new<F>(token: CancellationToken, observer: F) -> Self
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        Generator {
            token,
            observer: Box::new(observer),
        }
    }
}

impl PipelineComponent for Generator {
    type Input = (); // No input for the source
    type Output = i64;
    type Summary = u64;

    async fn run(&self, _input: Receiver<Self::Input>, output: Sender<Self::Output>, _context: ComponentContext) -> u64 {
        debug!("Generator starting");
        let mut value: i64 = 0;
        let mut emitted: u64 = 0;

        while !self.token.is_cancelled() {
            value += 1;
            if output.send_payload(value).await.is_err() {
                warn!("Generator output closed downstream after {} values", emitted);
                break;
            }
            (self.observer)(value);
            emitted += 1;
        }

        output.close();
        debug!("Generator completed after {} values", emitted);
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{channel, PipelineTask};
    use crate::tally::InputTally;
    use std::sync::Arc;

    #[tokio::test]
    async fn stops_and_closes_output_on_cancellation() {
        let token = CancellationToken::new();
        let tally = Arc::new(InputTally::new());
        let observer_tally = Arc::clone(&tally);
        let generator = PipelineTask::new(
            "generator",
            Generator::new(token.clone(), move |v| observer_tally.record(v)),
        );

        let (_unused, input) = channel::bounded::<()>(1);
        let (tx, rx) = channel::bounded::<i64>(1);
        let deployed = generator.deploy(vec![input], vec![tx]);

        let mut received = Vec::new();
        while let Ok(msg) = rx.recv().await {
            received.push(msg.payload);
            if received.len() == 10 {
                token.cancel();
            }
        }

        let emitted = deployed.join().await.unwrap()[0];
        assert!(received.len() >= 10);
        assert_eq!(received, (1..=received.len() as i64).collect::<Vec<_>>());
        assert_eq!(emitted, received.len() as u64);
        assert_eq!(tally.count(), emitted);
        assert_eq!(tally.sum(), received.iter().sum::<i64>());
    }

    #[tokio::test]
    async fn cancelled_before_start_emits_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let generator = PipelineTask::new("generator", Generator::new(token, |_| {}));

        let (_unused, input) = channel::bounded::<()>(1);
        let (tx, rx) = channel::bounded::<i64>(1);
        let deployed = generator.deploy(vec![input], vec![tx]);

        assert!(rx.recv().await.is_err());
        assert_eq!(deployed.join().await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn stops_when_consumer_goes_away() {
        let generator = PipelineTask::new("generator", Generator::new(CancellationToken::new(), |_| {}));

        let (_unused, input) = channel::bounded::<()>(1);
        let (tx, rx) = channel::bounded::<i64>(1);
        let deployed = generator.deploy(vec![input], vec![tx]);

        assert_eq!(rx.recv().await.unwrap().payload, 1);
        rx.close();

        let emitted = deployed.join().await.unwrap()[0];
        assert!(emitted >= 1);
    }
}
