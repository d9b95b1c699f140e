use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::model::config::GitHubConfig;
use crate::model::settings::Settings;
use crate::model::theme::{BaseMode, ThemeDescriptor};
use crate::sync::contents::{ContentStore, RepoTarget, VersionToken};
use crate::sync::error::StoreError;
use crate::sync::validate::{UnsupportedModeError, validate_selection};

static OWNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").expect("valid owner regex")
});
static REPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").expect("valid repo regex"));

/// Why an apply did not commit. Display strings are user-facing; transport
/// detail is logged where it happens and never carried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("Select a theme before applying.")]
    NoThemeSelected,
    #[error("Set the GitHub repo name, username and token first.")]
    MissingSettings,
    #[error("'{0}' is not a valid GitHub name.")]
    InvalidName(String),
    #[error(transparent)]
    UnsupportedMode(#[from] UnsupportedModeError),
    #[error("The theme file changed on GitHub while applying. Try again.")]
    Conflict,
    #[error("Failed to apply theme. Check your connection and credentials.")]
    Transport,
}

/// The `.env` payload the site build reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEnv {
    pub theme_url: String,
    pub base_mode: BaseMode,
}

impl ThemeEnv {
    pub fn from_selection(theme: &ThemeDescriptor, base_mode: BaseMode) -> Self {
        Self {
            theme_url: theme.css_url.clone(),
            base_mode,
        }
    }

    pub fn render(&self) -> String {
        format!("THEME={}\nBASE_THEME={}", self.theme_url, self.base_mode)
    }
}

/// A validated apply, ready to be committed.
#[derive(Debug, Clone)]
pub struct PreparedApply {
    pub target: RepoTarget,
    pub env: ThemeEnv,
}

/// Outcome of a committed apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// The file did not exist before this apply.
    pub created: bool,
    pub version: VersionToken,
}

/// Local half of the apply: validate the selection and derive the payload.
/// Touches no network, so a rejected selection never produces a commit.
pub fn prepare_apply(settings: &Settings) -> Result<PreparedApply, ApplyError> {
    let theme = settings.theme.as_ref().ok_or(ApplyError::NoThemeSelected)?;
    validate_selection(theme, settings.base_theme)?;

    let target = repo_target(settings)?;
    Ok(PreparedApply {
        target,
        env: ThemeEnv::from_selection(theme, settings.base_theme),
    })
}

fn repo_target(settings: &Settings) -> Result<RepoTarget, ApplyError> {
    let owner = settings.github_user_name.trim();
    let repo = settings.github_repo.trim();
    let token = settings.github_token.trim();

    if owner.is_empty() || repo.is_empty() || token.is_empty() {
        return Err(ApplyError::MissingSettings);
    }
    if !OWNER_RE.is_match(owner) {
        return Err(ApplyError::InvalidName(owner.to_string()));
    }
    if !REPO_RE.is_match(repo) || repo == "." || repo == ".." {
        return Err(ApplyError::InvalidName(repo.to_string()));
    }

    Ok(RepoTarget::new(owner, repo, token))
}

/// Remote half of the apply: read the config file for its version, then
/// write the payload. A missing file is created; nothing is retried.
pub async fn commit_theme(
    store: &dyn ContentStore,
    prepared: &PreparedApply,
    github: &GitHubConfig,
) -> Result<ApplyReport, ApplyError> {
    let path = github.config_path.as_str();

    let existing = match store.read_file(&prepared.target, path).await {
        Ok(file) => Some(file.version),
        Err(err) if err.is_not_found() => {
            tracing::info!("{path} not found in repository, creating it");
            None
        }
        Err(err) => return Err(surface(err, "read")),
    };

    let version = store
        .write_file(
            &prepared.target,
            path,
            &prepared.env.render(),
            &github.commit_message,
            existing.as_ref(),
        )
        .await
        .map_err(|err| surface(err, "write"))?;

    tracing::info!(
        "theme applied to {}/{} ({})",
        prepared.target.owner,
        prepared.target.repo,
        prepared.env.base_mode
    );

    Ok(ApplyReport {
        created: existing.is_none(),
        version,
    })
}

fn surface(err: StoreError, phase: &str) -> ApplyError {
    match err {
        StoreError::Conflict { .. } => {
            tracing::warn!("apply {phase} conflict: {err}");
            ApplyError::Conflict
        }
        // NotFound on write means the repository itself is missing.
        other => {
            tracing::warn!("apply {phase} failed: {other}");
            ApplyError::Transport
        }
    }
}
