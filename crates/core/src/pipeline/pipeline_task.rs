use super::channel::{Receiver, Sender};
use super::component_context::ComponentContext;
use super::pipeline_component::PipelineComponent;
use crate::error::PipelineError;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Deploys one component onto `slots` concurrent tokio tasks.
pub struct PipelineTask<T: PipelineComponent> {
    name: &'static str,
    component: Arc<T>,
    slots: usize,
}

/// Join handles of a deployed [`PipelineTask`], one per slot.
pub struct DeployedTask<S> {
    name: &'static str,
    tasks: Vec<JoinHandle<S>>,
}

impl<T: PipelineComponent> PipelineTask<T> {
    pub fn new(name: &'static str, component: T) -> Self {
        PipelineTask::with_slots(name, component, 1)
    }

    pub fn with_slots(name: &'static str, component: T, slots: usize) -> Self {
        debug!("Creating PipelineTask {} with {} slots", name, slots);
        PipelineTask {
            name,
            component: Arc::new(component),
            slots,
        }
    }

    /// Spawns one task per slot. Slot `i` reads `inputs[i]` and writes `outputs[i]`.
    ///
    /// Pass clones of a single receiver as `inputs` for competing consumers,
    /// and clones of a single sender as `outputs` to fan in.
    ///
    /// # Panics
    ///
    /// Panics if either vector does not hold exactly one endpoint per slot.
    pub fn deploy(
        &self,
        inputs: Vec<Receiver<T::Input>>,
        outputs: Vec<Sender<T::Output>>,
    ) -> DeployedTask<T::Summary> {
        assert_eq!(inputs.len(), self.slots, "{} requires one input receiver per slot", self.name);
        assert_eq!(outputs.len(), self.slots, "{} requires one output sender per slot", self.name);

        let mut tasks = Vec::with_capacity(self.slots);
        for (slot, (input, output)) in inputs.into_iter().zip(outputs).enumerate() {
            let component = Arc::clone(&self.component);
            let context = ComponentContext { slot };

            let name = self.name;
            let task = tokio::spawn(async move {
                debug!("Starting {} slot {}", name, slot);
                let summary = component.run(input, output, context).await;
                debug!("{} slot {} completed", name, slot);
                summary
            });
            tasks.push(task);
        }

        DeployedTask {
            name: self.name,
            tasks,
        }
    }
}

impl<S> DeployedTask<S> {
    /// Waits for every slot and returns their summaries in slot order.
    ///
    /// Every slot is awaited even if an earlier one failed; the first failure is returned.
    pub async fn join(self) -> Result<Vec<S>, PipelineError> {
        let name = self.name;
        let mut summaries = Vec::with_capacity(self.tasks.len());
        let mut failure = None;

        for (slot, result) in join_all(self.tasks).await.into_iter().enumerate() {
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    error!("{} slot {} failed: {:?}", name, slot, e);
                    failure.get_or_insert(PipelineError::TaskFailed { stage: name, source: e });
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(summaries),
        }
    }
}
