pub mod content;
pub mod fetcher;
pub mod pulls;

pub use fetcher::{GitHubFetcher, GitHubFetcherConfig};
pub use pulls::{NewPullRequest, PullRequest, PullRequestClient, PullRequestError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const USER_AGENT: &str = concat!("repo-file-sync/", env!("CARGO_PKG_VERSION"));
