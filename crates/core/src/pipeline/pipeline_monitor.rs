use super::channel::{Receiver, WeakReceiver};
use super::message::now_millis;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// A snapshot of one conduit: name, queued messages, capacity and last receive time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConduitMetrics {
    pub name: String,
    pub queued: usize,
    pub capacity: Option<usize>,
    pub last_receive_time: i64,
}

pub trait MonitoredTask: Send + Sync {
    fn get_metrics(&self) -> Vec<ConduitMetrics>;
}

/// Observes a conduit through a weak receiver, so it never keeps the conduit
/// open in either direction. Reports nothing once every consumer is gone.
pub struct ConduitGauge<T> {
    name: String,
    receiver: WeakReceiver<T>,
}

impl<T> ConduitGauge<T> {
    pub fn new(name: impl Into<String>, receiver: &Receiver<T>) -> Self {
        ConduitGauge {
            name: name.into(),
            receiver: receiver.downgrade(),
        }
    }
}

impl<T: Send> MonitoredTask for ConduitGauge<T> {
    fn get_metrics(&self) -> Vec<ConduitMetrics> {
        let Some(receiver) = self.receiver.upgrade() else {
            return Vec::new();
        };
        vec![ConduitMetrics {
            name: self.name.clone(),
            queued: receiver.len(),
            capacity: receiver.capacity(),
            last_receive_time: receiver.last_receive_time(),
        }]
    }
}

pub struct PipelineMonitor {
    tasks: Vec<Arc<dyn MonitoredTask>>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineMonitor {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            handle: None,
        }
    }

    pub fn register_monitor<T: MonitoredTask + 'static>(&mut self, task: Arc<T>) {
        debug!("Registering new task with monitor");
        self.tasks.push(task as Arc<dyn MonitoredTask>);
        debug!("Total registered tasks: {}", self.tasks.len());
    }

    pub fn snapshot(&self) -> Vec<ConduitMetrics> {
        self.tasks.iter().flat_map(|task| task.get_metrics()).collect()
    }

    pub fn start(&mut self, period: Duration) {
        if self.handle.is_some() {
            debug!("Monitoring task already running");
            return;
        }

        debug!("Starting monitoring task");
        let tasks = self.tasks.clone();
        debug!("Initial number of tasks to monitor: {}", tasks.len());

        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;

                if tasks.is_empty() {
                    debug!("No tasks to monitor");
                    continue;
                }

                let now = now_millis();
                info!("Pipeline Metrics:");
                for metrics in tasks.iter().flat_map(|task| task.get_metrics()) {
                    let idle = if metrics.last_receive_time > 0 {
                        now.saturating_sub(metrics.last_receive_time)
                    } else {
                        -1
                    };
                    match metrics.capacity {
                        Some(capacity) => info!("{}: {}/{} (idle {} ms)", metrics.name, metrics.queued, capacity, idle),
                        None => info!("{}: {} (idle {} ms)", metrics.name, metrics.queued, idle),
                    }
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping monitoring task");
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for PipelineMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PipelineMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel;

    #[tokio::test]
    async fn gauge_reports_queue_depth() {
        let (tx, rx) = channel::bounded::<i64>(4);
        tx.send_payload(1).await.unwrap();
        tx.send_payload(2).await.unwrap();

        let mut monitor = PipelineMonitor::new();
        monitor.register_monitor(Arc::new(ConduitGauge::new("input", &rx)));

        let metrics = monitor.snapshot();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "input");
        assert_eq!(metrics[0].queued, 2);
        assert_eq!(metrics[0].capacity, Some(4));
        assert_eq!(metrics[0].last_receive_time, 0);
    }

    #[tokio::test]
    async fn watched_conduit_rejects_sends_once_consumer_is_gone() {
        let (tx, rx) = channel::bounded::<i64>(1);
        let mut monitor = PipelineMonitor::new();
        monitor.register_monitor(Arc::new(ConduitGauge::new("input", &rx)));

        drop(rx);
        assert!(tx.send_payload(1).await.is_err());
        assert!(monitor.snapshot().is_empty());
    }

    #[tokio::test]
    async fn generator_on_watched_conduit_stops_when_consumer_is_gone() {
        use crate::pipeline::PipelineTask;
        use crate::sources::Generator;
        use tokio_util::sync::CancellationToken;

        let (_unused, input) = channel::bounded::<()>(1);
        let (tx, rx) = channel::bounded::<i64>(1);
        let mut monitor = PipelineMonitor::new();
        monitor.register_monitor(Arc::new(ConduitGauge::new("input", &rx)));

        let deployed = PipelineTask::new("generator", Generator::new(CancellationToken::new(), |_| {}))
            .deploy(vec![input], vec![tx]);
        assert_eq!(rx.recv().await.unwrap().payload, 1);
        drop(rx);

        let emitted = tokio::time::timeout(Duration::from_secs(5), deployed.join())
            .await
            .expect("generator kept running after its consumer was dropped")
            .unwrap();
        assert!(emitted[0] >= 1);
    }

    #[tokio::test]
    async fn gauge_does_not_hold_conduit_open() {
        let (tx, rx) = channel::bounded::<i64>(1);
        let mut monitor = PipelineMonitor::new();
        monitor.register_monitor(Arc::new(ConduitGauge::new("input", &rx)));
        monitor.start(Duration::from_millis(5));
        assert!(monitor.is_running());

        drop(tx);
        assert!(rx.recv().await.is_err());

        monitor.stop();
        assert!(!monitor.is_running());
    }
}
