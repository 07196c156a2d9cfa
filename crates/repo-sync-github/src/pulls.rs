use serde::{Deserialize, Serialize};

use crate::{DEFAULT_API_BASE_URL, USER_AGENT};

/// Errors that can occur when opening a pull request.
#[derive(Debug, thiserror::Error)]
pub enum PullRequestError {
    #[error("a pull request for {head} already exists")]
    AlreadyExists { head: String },

    #[error("GitHub API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Body of `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub html_url: String,
    pub number: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl ApiErrorBody {
    fn describe(&self) -> String {
        let details: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.message.as_deref())
            .collect();
        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, details.join("; "))
        }
    }
}

/// Opens pull requests through the GitHub REST API.
pub struct PullRequestClient {
    client: reqwest::Client,
    token: String,
    api_base_url: Option<String>,
}

impl PullRequestClient {
    pub fn new(token: impl Into<String>, api_base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base_url,
        }
    }

    fn api_base(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Open a pull request against `repository` (`owner/name`).
    pub async fn create(
        &self,
        repository: &str,
        request: &NewPullRequest<'_>,
    ) -> Result<PullRequest, PullRequestError> {
        let url = format!("{}/repos/{}/pulls", self.api_base(), repository);
        tracing::debug!(%url, head = request.head, base = request.base, "creating pull request");

        let response = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .json(request)
            .send()
            .await
            .map_err(|e| PullRequestError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let pr: PullRequest = response
                .json()
                .await
                .map_err(|e| PullRequestError::Parse(e.to_string()))?;
            tracing::info!(url = %pr.html_url, number = pr.number, "pull request created");
            return Ok(pr);
        }

        let text = response.text().await.unwrap_or_else(|_| "unknown".into());
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.describe())
            .unwrap_or(text);

        if status.as_u16() == 422 && message.contains("already exists") {
            return Err(PullRequestError::AlreadyExists {
                head: request.head.to_owned(),
            });
        }

        Err(PullRequestError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
