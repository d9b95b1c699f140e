use thiserror::Error;

/// Failures of the contents store.
///
/// `NotFound` and `Conflict` are protocol outcomes the caller acts on. Every
/// other variant is a transport failure and must be shown to the user only
/// generically; the detail is for logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path} does not exist in the repository")]
    NotFound { path: String },
    #[error("{path} changed remotely since it was read")]
    Conflict { path: String },
    #[error("credentials rejected (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("unexpected HTTP {status}")]
    Status { status: u16 },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        !matches!(
            self,
            StoreError::NotFound { .. } | StoreError::Conflict { .. }
        )
    }
}
