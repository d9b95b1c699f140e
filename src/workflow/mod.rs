pub mod creator;
pub mod indicator;
pub mod pull_request;

pub use creator::{CommandPullRequestCreator, PullRequestCreator, PullRequestError};
pub use indicator::LoadingIndicator;
pub use pull_request::{AttemptId, PullRequestWorkflow, WorkflowError, WorkflowState};
