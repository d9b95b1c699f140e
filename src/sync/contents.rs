use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::model::config::GitHubConfig;
use crate::sync::codec::{decode_content, encode_content};
use crate::sync::error::StoreError;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Repository a read or write is addressed to, plus the credential for it.
#[derive(Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
    token: String,
}

impl RepoTarget {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoTarget")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Opaque blob hash the server checks on write (compare-and-set).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(pub String);

/// A file as read from the remote, alive for one read-modify-write cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub version: VersionToken,
}

/// Single-file access to a hosted repository.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// `StoreError::NotFound` means the file does not exist yet.
    async fn read_file(&self, target: &RepoTarget, path: &str) -> Result<RemoteFile, StoreError>;

    /// Commit `content` at `path`. With `version` the write only succeeds if
    /// the remote is still at that version; without it the file is created.
    /// Returns the version of the newly written file.
    async fn write_file(
        &self,
        target: &RepoTarget,
        path: &str,
        content: &str,
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError>;
}

/// [`ContentStore`] over the GitHub REST contents endpoint.
#[derive(Debug, Clone)]
pub struct GitHubContents {
    client: reqwest::Client,
    api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: CommittedContent,
}

#[derive(Debug, Deserialize)]
struct CommittedContent {
    sha: String,
}

impl GitHubContents {
    pub fn new(config: &GitHubConfig) -> Result<Self, StoreError> {
        let client = super::http_client(&config.user_agent)?;
        Ok(Self::with_client(client, &config.api_base_url))
    }

    pub fn with_client(client: reqwest::Client, api_base_url: &str) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn contents_url(&self, target: &RepoTarget, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url,
            target.owner,
            target.repo,
            path.trim_start_matches('/')
        )
    }

    fn request(
        &self,
        method: reqwest::Method,
        target: &RepoTarget,
        path: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.contents_url(target, path))
            .bearer_auth(target.token())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }
}

#[async_trait]
impl ContentStore for GitHubContents {
    async fn read_file(&self, target: &RepoTarget, path: &str) -> Result<RemoteFile, StoreError> {
        tracing::debug!("GET contents {}/{}:{}", target.owner, target.repo, path);
        let resp = self
            .request(reqwest::Method::GET, target, path)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify(status, path));
        }

        let body: ContentsResponse = resp
            .json()
            .await
            .map_err(|err| StoreError::Malformed(format!("contents of {path}: {err}")))?;

        if let Some(encoding) = body.encoding.as_deref()
            && encoding != "base64"
        {
            return Err(StoreError::Malformed(format!(
                "unsupported encoding {encoding} for {path}"
            )));
        }

        let content = match body.content.as_deref() {
            Some(encoded) => decode_content(encoded)
                .map_err(|err| StoreError::Malformed(format!("{path}: {err}")))?,
            None => String::new(),
        };

        Ok(RemoteFile {
            path: body.path,
            content,
            version: VersionToken(body.sha),
        })
    }

    async fn write_file(
        &self,
        target: &RepoTarget,
        path: &str,
        content: &str,
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        tracing::debug!(
            "PUT contents {}/{}:{} ({})",
            target.owner,
            target.repo,
            path,
            if version.is_some() { "update" } else { "create" }
        );

        let body = PutContentsRequest {
            message,
            content: encode_content(content),
            sha: version.map(|v| v.0.as_str()),
        };

        let resp = self
            .request(reqwest::Method::PUT, target, path)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify(status, path));
        }

        let committed: PutContentsResponse = resp
            .json()
            .await
            .map_err(|err| StoreError::Malformed(format!("commit of {path}: {err}")))?;

        Ok(VersionToken(committed.content.sha))
    }
}

/// Map a non-success status to the store's error taxonomy.
///
/// 409 is a stale `sha`. 422 is returned when a file already exists but no
/// `sha` was sent, i.e. someone created it after our read; both are conflicts.
fn classify(status: StatusCode, path: &str) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            path: path.to_string(),
        },
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Conflict {
            path: path.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized {
            status: status.as_u16(),
        },
        other => StoreError::Status {
            status: other.as_u16(),
        },
    }
}
