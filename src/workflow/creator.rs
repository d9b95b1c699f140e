use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::model::settings::Settings;

#[derive(Debug, Error)]
pub enum PullRequestError {
    #[error("no pull request command configured (set pull_request.command)")]
    NotConfigured,
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {code:?}")]
    Exit { program: String, code: Option<i32> },
    #[error("{program} printed non-UTF-8 output")]
    Output { program: String },
    #[error("pull request task aborted: {0}")]
    Aborted(String),
}

/// Whatever actually opens the template pull request.
///
/// `Ok(Some(url))` is a created pull request, `Ok(None)` means there was
/// nothing to propose.
#[async_trait]
pub trait PullRequestCreator: Send + Sync {
    async fn create_pull_request(
        &self,
        settings: &Settings,
    ) -> Result<Option<String>, PullRequestError>;
}

/// Runs an external command that prints the PR URL on stdout.
#[derive(Debug, Clone)]
pub struct CommandPullRequestCreator {
    command: Vec<String>,
}

impl CommandPullRequestCreator {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl PullRequestCreator for CommandPullRequestCreator {
    async fn create_pull_request(
        &self,
        settings: &Settings,
    ) -> Result<Option<String>, PullRequestError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(PullRequestError::NotConfigured);
        };

        tracing::info!("running pull request command: {program}");
        let output = Command::new(program)
            .args(args)
            .env("GARDEN_GITHUB_REPO", &settings.github_repo)
            .env("GARDEN_GITHUB_USER", &settings.github_user_name)
            .env("GARDEN_GITHUB_TOKEN", &settings.github_token)
            .env("GARDEN_BASE_URL", &settings.garden_base_url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| PullRequestError::Spawn {
                program: program.clone(),
                source,
            })?;

        // stderr can echo the token back; it stays out of errors and logs.
        if !output.status.success() {
            return Err(PullRequestError::Exit {
                program: program.clone(),
                code: output.status.code(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| PullRequestError::Output {
            program: program.clone(),
        })?;

        let url = stdout.trim();
        Ok((!url.is_empty()).then(|| url.to_string()))
    }
}
