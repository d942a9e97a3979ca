//! Run orchestration

pub mod poller;
pub mod workflow;

pub use poller::{TaskOutcome, TaskPoller, TaskReport};
pub use workflow::{
    PublishPolicy, PublishWorkflow, RunOutcome, RunReport, RunRequest, TrackRequest,
    WorkflowState,
};
