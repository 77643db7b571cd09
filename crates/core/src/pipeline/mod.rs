pub mod channel;
pub mod component_context;
pub mod message;
pub mod pipeline_component;
pub mod pipeline_monitor;
pub mod pipeline_task;

pub use channel::{Sender, Receiver, WeakReceiver};
pub use message::Message;
pub use component_context::ComponentContext;
pub use pipeline_component::PipelineComponent;
pub use pipeline_monitor::{ConduitMetrics, ConduitGauge, MonitoredTask, PipelineMonitor};
pub use pipeline_task::{DeployedTask, PipelineTask};
