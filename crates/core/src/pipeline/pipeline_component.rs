use super::channel::{Receiver, Sender};
use super::component_context::ComponentContext;

/// A pipeline stage. One instance is shared by every slot it is deployed to.
///
/// `run` consumes its input until the conduit reports end-of-stream, writes to
/// its output, and returns a per-slot summary. Dropping `output` on return is
/// what propagates end-of-stream downstream.
pub trait PipelineComponent: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;
    type Summary: Send + 'static;

    fn run(&self, input: Receiver<Self::Input>, output: Sender<Self::Output>, context: ComponentContext)
        -> impl std::future::Future<Output = Self::Summary> + Send;
}
