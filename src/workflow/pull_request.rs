use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;

use crate::model::history::PullRequestHistory;
use crate::model::settings::Settings;
use crate::workflow::creator::{PullRequestCreator, PullRequestError};
use crate::workflow::indicator::LoadingIndicator;

/// Shown for every failed attempt; the cause stays in the log.
pub const FAILURE_NOTICE: &str = "Something went wrong. Try deleting the branch in GitHub.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Loading,
    /// `None` means there were no differences to propose.
    Success { pull_request: Option<String> },
    Error,
}

/// Identifies one `start()`. Completions carrying an older id are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("a pull request is already being created")]
    AlreadyLoading,
}

pub type PullRequestResult = Result<Option<String>, PullRequestError>;

/// Idle → Loading → Success | Error, re-entered only through [`start`].
///
/// The loading indicator runs exactly while the state is `Loading`.
///
/// [`start`]: PullRequestWorkflow::start
#[derive(Debug)]
pub struct PullRequestWorkflow {
    state: WorkflowState,
    indicator: LoadingIndicator,
    runtime: Handle,
    attempt: u64,
}

impl PullRequestWorkflow {
    pub fn new(runtime: Handle, indicator: LoadingIndicator) -> Self {
        Self {
            state: WorkflowState::Idle,
            indicator,
            runtime,
            attempt: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == WorkflowState::Loading
    }

    pub fn indicator(&self) -> &LoadingIndicator {
        &self.indicator
    }

    /// Enter `Loading` and run `creator` in the background. `on_done` is
    /// called from the runtime with the outcome; route it back into
    /// [`PullRequestWorkflow::finish`] on the owning side.
    pub fn start<F>(
        &mut self,
        creator: Arc<dyn PullRequestCreator>,
        settings: Settings,
        on_done: F,
    ) -> Result<AttemptId, WorkflowError>
    where
        F: FnOnce(AttemptId, PullRequestResult) + Send + 'static,
    {
        if self.is_loading() {
            tracing::debug!("pull request start ignored: already loading");
            return Err(WorkflowError::AlreadyLoading);
        }

        self.attempt += 1;
        let attempt = AttemptId(self.attempt);
        self.state = WorkflowState::Loading;
        self.indicator.start();
        tracing::info!("pull request attempt {} started", attempt.0);

        // The collaborator runs in its own task so a panic still reports back.
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let job = runtime.spawn(async move { creator.create_pull_request(&settings).await });
            let result = match job.await {
                Ok(result) => result,
                Err(err) => Err(PullRequestError::Aborted(err.to_string())),
            };
            on_done(attempt, result);
        });

        Ok(attempt)
    }

    /// Feed a collaborator result into the state machine.
    pub fn finish(
        &mut self,
        attempt: AttemptId,
        result: PullRequestResult,
        history: &mut PullRequestHistory,
    ) -> bool {
        match result {
            Ok(outcome) => self.on_complete(attempt, outcome, history),
            Err(err) => self.on_failure(attempt, &err),
        }
    }

    /// Loading → Success. A non-empty outcome is appended to `history`.
    pub fn on_complete(
        &mut self,
        attempt: AttemptId,
        outcome: Option<String>,
        history: &mut PullRequestHistory,
    ) -> bool {
        if !self.accepts(attempt) {
            return false;
        }

        self.indicator.stop();
        let pull_request = outcome
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        match &pull_request {
            Some(url) => {
                tracing::info!("pull request created: {url}");
                history.push(url.clone());
            }
            None => tracing::info!("pull request skipped: template already up to date"),
        }

        self.state = WorkflowState::Success { pull_request };
        true
    }

    /// Loading → Error. Only [`FAILURE_NOTICE`] reaches the display.
    pub fn on_failure(&mut self, attempt: AttemptId, error: &PullRequestError) -> bool {
        if !self.accepts(attempt) {
            return false;
        }

        self.indicator.stop();
        tracing::warn!("pull request attempt {} failed: {error}", attempt.0);
        self.state = WorkflowState::Error;
        true
    }

    /// Back to `Idle`; any in-flight attempt's completion will be dropped.
    pub fn reset(&mut self) {
        self.indicator.stop();
        self.attempt += 1;
        self.state = WorkflowState::Idle;
    }

    fn accepts(&self, attempt: AttemptId) -> bool {
        if self.state != WorkflowState::Loading || attempt.0 != self.attempt {
            tracing::debug!("stale pull request completion {} ignored", attempt.0);
            return false;
        }
        true
    }
}
