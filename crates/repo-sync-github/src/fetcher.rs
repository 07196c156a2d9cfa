use std::time::Duration;

use repo_sync::{FetchError, Fetcher, source::file_id};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{StatusCode, Url};

use crate::content::ContentResponse;
use crate::{DEFAULT_API_BASE_URL, DEFAULT_RAW_BASE_URL, USER_AGENT};

/// Configuration for fetching files from GitHub.
#[derive(Debug, Clone)]
pub struct GitHubFetcherConfig {
    /// Enables the authenticated contents API fallback.
    pub token: Option<String>,
    pub timeout: Duration,
    pub raw_base_url: Option<String>,
    pub api_base_url: Option<String>,
}

impl Default for GitHubFetcherConfig {
    fn default() -> Self {
        Self {
            token: None,
            timeout: Duration::from_secs(30),
            raw_base_url: None,
            api_base_url: None,
        }
    }
}

/// Fetches repository files from the raw content endpoint, falling back to
/// the authenticated contents API when a token is configured.
///
/// The underlying HTTP client is shared by every request made through this
/// fetcher and released when it is dropped.
pub struct GitHubFetcher {
    config: GitHubFetcherConfig,
    client: reqwest::Client,
}

impl GitHubFetcher {
    pub fn new(config: GitHubFetcherConfig) -> Self {
        if config.token.is_some() {
            tracing::debug!("GitHub token configured for private repository access");
        }
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn raw_base(&self) -> &str {
        self.config
            .raw_base_url
            .as_deref()
            .unwrap_or(DEFAULT_RAW_BASE_URL)
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    fn build_request(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.config.timeout)
    }

    /// `{raw_base}/{owner}/{name}/{reference}/{path}`
    pub fn raw_url(&self, repository: &str, reference: &str, path: &str) -> Result<Url, FetchError> {
        let segments = repository
            .split('/')
            .chain(reference.split('/'))
            .chain(path.trim_start_matches('/').split('/'));
        join_segments(self.raw_base(), segments)
    }

    /// `{api_base}/repos/{owner}/{name}/contents/{path}?ref={reference}`
    pub fn contents_url(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Url, FetchError> {
        let segments = std::iter::once("repos")
            .chain(repository.split('/'))
            .chain(std::iter::once("contents"))
            .chain(path.trim_start_matches('/').split('/'));
        let mut url = join_segments(self.api_base(), segments)?;
        url.query_pairs_mut().append_pair("ref", reference);
        Ok(url)
    }

    async fn fetch_raw(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.raw_url(repository, reference, path)?;
        tracing::debug!(%url, "trying raw URL");

        let response = self
            .build_request(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Network(format!(
                "raw URL returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn fetch_via_api(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
        token: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.contents_url(repository, reference, path)?;
        tracing::debug!(%url, "trying contents API");

        let response = self
            .build_request(url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "contents API returned HTTP {}",
                response.status()
            )));
        }

        let content: ContentResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("malformed contents response: {e}")))?;

        content.decode()
    }

    /// Probe a well-known public file to confirm GitHub is reachable.
    pub async fn check_connection(&self) -> bool {
        let url = match self.raw_url("actions/checkout", "main", "README.md") {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self.build_request(url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!("connectivity check failed: {e}");
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for GitHubFetcher {
    async fn fetch(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let id = file_id(repository, reference, path);
        tracing::info!("downloading {id}");

        let mut failure = match self.fetch_raw(repository, reference, path).await {
            Ok(content) => {
                tracing::info!("downloaded {id} ({} bytes)", content.len());
                return Ok(content);
            }
            Err(e) => {
                tracing::debug!("raw URL download failed: {e}");
                e
            }
        };

        if let Some(token) = &self.config.token {
            tracing::debug!("raw URL failed, trying contents API");
            match self.fetch_via_api(repository, reference, path, token).await {
                Ok(content) => {
                    tracing::info!("downloaded {id} via contents API ({} bytes)", content.len());
                    return Ok(content);
                }
                Err(e) => {
                    tracing::debug!("contents API download failed: {e}");
                    failure = e;
                }
            }
        }

        Err(FetchError::NotFound {
            id,
            reason: failure.to_string(),
        })
    }
}

/// Characters left intact in a path segment: ASCII alphanumerics and the
/// RFC 3986 unreserved marks. Everything else, reserved characters included,
/// is percent-encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn join_segments<'a>(
    base: &str,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(base).map_err(|e| FetchError::Other(format!("invalid base URL {base}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(FetchError::Other(format!("base URL cannot have a path: {base}")));
    }

    let mut path = url.path().trim_end_matches('/').to_owned();
    for segment in segments {
        path.push('/');
        path.extend(utf8_percent_encode(segment, SEGMENT));
    }
    url.set_path(&path);
    Ok(url)
}
