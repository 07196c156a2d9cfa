use std::sync::Arc;

/// Errors that can occur when fetching a file from a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// No fetch path could produce the file. `reason` carries the last
    /// underlying failure (HTTP status, transport or decode error).
    #[error("file not found: {id} ({reason})")]
    NotFound { id: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

/// Resolves a `(repository, reference, path)` triple to raw file bytes.
///
/// Implementations perform network I/O only; they never touch the output tree.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError>;
}

#[async_trait::async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(repository, reference, path).await
    }
}
