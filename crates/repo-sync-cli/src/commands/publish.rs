use std::path::Path;

use anyhow::{Context, Result};
use repo_sync::CancelToken;
use repo_sync_github::{NewPullRequest, PullRequestClient, PullRequestError};

use crate::git::Git;

pub struct PublishOptions<'a> {
    pub branch: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

/// Commit the output tree to `branch`, push it, and open a pull request.
///
/// Nothing is pushed or opened when the output tree has no changes or when
/// `cancel` fires before the push or before the pull request is opened.
pub async fn run(
    output: &Path,
    options: &PublishOptions<'_>,
    token: Option<String>,
    cancel: &CancelToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        tracing::warn!("interrupted, nothing published");
        return Ok(());
    }

    let repository = std::env::var("GITHUB_REPOSITORY")
        .context("GITHUB_REPOSITORY environment variable not set")?;
    let token = token.context("GITHUB_TOKEN is required to create a pull request")?;

    let workdir = std::env::current_dir().context("could not determine working directory")?;
    let git = Git::new(workdir);

    git.create_or_update_branch(options.branch, None).await?;
    if cancel.is_cancelled() {
        tracing::warn!("interrupted, nothing pushed");
        return Ok(());
    }
    if !git.commit_and_push(options.title, &[output]).await? {
        println!("No changes to publish.");
        return Ok(());
    }
    if cancel.is_cancelled() {
        tracing::warn!(branch = options.branch, "interrupted after push, pull request not opened");
        return Ok(());
    }

    let client = PullRequestClient::new(token, None);
    let request = NewPullRequest {
        title: options.title,
        body: options.body,
        head: options.branch,
        base: options.base,
    };

    match client.create(&repository, &request).await {
        Ok(pr) => {
            println!("Pull request created: {}", pr.html_url);
            Ok(())
        }
        Err(PullRequestError::AlreadyExists { head }) => {
            println!("Pull request for {head} already exists; branch updated.");
            Ok(())
        }
        Err(e) => Err(e).context("failed to create pull request"),
    }
}
