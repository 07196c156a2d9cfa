use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;

const BOT_NAME: &str = "github-actions[bot]";
const BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

/// Errors from invoking the `git` binary.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },
}

/// Thin wrapper around the `git` command line, rooted at a working tree.
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        tracing::debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                args: args.join(" "),
                source,
            })
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(GitError::Command {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    async fn succeeds(&self, args: &[&str]) -> Result<bool, GitError> {
        Ok(self.output(args).await?.status.success())
    }

    /// Check out `name`, creating it or resetting it to `base` (or the
    /// current `HEAD` when no base is given).
    pub async fn create_or_update_branch(
        &self,
        name: &str,
        base: Option<&str>,
    ) -> Result<bool, GitError> {
        let mut args = vec!["checkout", "-B", name];
        args.extend(base);
        self.run(&args).await?;
        tracing::info!(branch = name, "checked out branch");
        Ok(true)
    }

    /// Stage `paths`, commit, and push the current branch to `origin`.
    ///
    /// Returns `false` without committing when staging leaves nothing to commit.
    pub async fn commit_and_push(&self, message: &str, paths: &[&Path]) -> Result<bool, GitError> {
        self.ensure_identity().await?;

        let mut add = vec!["add".to_owned(), "--".to_owned()];
        add.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        let add: Vec<&str> = add.iter().map(String::as_str).collect();
        self.run(&add).await?;

        if self.succeeds(&["diff", "--cached", "--quiet"]).await? {
            tracing::info!("no changes to commit");
            return Ok(false);
        }

        self.run(&["commit", "-m", message]).await?;
        self.refresh_remote_branch().await?;
        self.run(&["push", "--force-with-lease", "-u", "origin", "HEAD"])
            .await?;
        tracing::info!("committed and pushed changes");
        Ok(true)
    }

    /// Update `origin/<branch>` for the current branch so the lease in
    /// `commit_and_push` has an expected value. Shallow, single-branch
    /// checkouts otherwise carry no tracking ref and the push is refused as
    /// stale. A branch missing on the remote is not an error.
    async fn refresh_remote_branch(&self) -> Result<(), GitError> {
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
        if !self.succeeds(&["fetch", "--no-tags", "origin", &refspec]).await? {
            tracing::debug!(branch, "branch not on remote yet");
        }
        Ok(())
    }

    async fn ensure_identity(&self) -> Result<(), GitError> {
        if !self.succeeds(&["config", "user.name"]).await? {
            self.run(&["config", "user.name", BOT_NAME]).await?;
        }
        if !self.succeeds(&["config", "user.email"]).await? {
            self.run(&["config", "user.email", BOT_EMAIL]).await?;
        }
        Ok(())
    }
}
