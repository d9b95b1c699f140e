//! Remote side of the panel: the repository contents store, the theme
//! catalog, and the apply-theme read-modify-write flow.

pub mod apply;
pub mod catalog;
pub mod codec;
pub mod contents;
pub mod error;
pub mod validate;

pub use apply::{ApplyError, ApplyReport, PreparedApply, ThemeEnv, commit_theme, prepare_apply};
pub use contents::{ContentStore, GitHubContents, RemoteFile, RepoTarget, VersionToken};
pub use error::StoreError;
pub use validate::{UnsupportedModeError, validate_selection};

/// Shared HTTP client settings for every outbound request.
pub fn http_client(user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(30))
        .build()
}
