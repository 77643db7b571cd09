/// Where a component instance runs inside its [`PipelineTask`](super::PipelineTask).
#[derive(Clone, Copy, Debug)]
pub struct ComponentContext {
    pub slot: usize,
}
