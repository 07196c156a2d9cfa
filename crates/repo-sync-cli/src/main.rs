mod commands;
mod config;
mod git;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use repo_sync::{CancelToken, SyncOptions, SyncResult};
use repo_sync_github::{GitHubFetcher, GitHubFetcherConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::publish::PublishOptions;

/// Exit status used when the sync is interrupted.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "repo-file-sync", version)]
#[command(about = "Synchronize files from GitHub repositories based on YAML configuration")]
struct Cli {
    /// Path to the configuration YAML file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output directory for downloaded files
    #[arg(short, long, default_value = "./synced-files")]
    output: PathBuf,

    /// Show what would be downloaded without downloading
    #[arg(long)]
    dry_run: bool,

    /// Nest files under a per-repository directory instead of flattening them
    #[arg(long)]
    preserve_structure: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Test GitHub connectivity and exit
    #[arg(long)]
    test_connection: bool,

    /// Commit the synced files to a branch and open a pull request
    #[arg(long)]
    create_pr: bool,

    /// Title for the pull request (also used as the commit message)
    #[arg(long, default_value = "Sync files from repositories")]
    pr_title: String,

    /// Body for the pull request
    #[arg(long, default_value = "Automated file sync from configured repositories")]
    pr_body: String,

    /// Branch the synced files are pushed to
    #[arg(long, default_value = "sync/repo-files")]
    branch_name: String,

    /// Branch the pull request targets
    #[arg(long, default_value = "main")]
    base_branch: String,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
}

/// Cancel `token` on the first Ctrl-C; the file in flight is allowed to finish.
fn cancel_on_interrupt(token: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current file");
            token.cancel();
        }
    });
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let fetcher = GitHubFetcher::new(GitHubFetcherConfig {
        token: github_token(),
        timeout: Duration::from_secs(cli.timeout),
        ..GitHubFetcherConfig::default()
    });

    if cli.test_connection {
        let connected = commands::check::run(&fetcher).await;
        return Ok(if connected {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let config = config::load_config(&cli.config).context("failed to load configuration")?;

    let options = SyncOptions {
        dry_run: cli.dry_run,
        preserve_structure: cli.preserve_structure,
    };
    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone());

    let result =
        commands::sync::run(fetcher, &config, &cli.output, options, cancel.clone()).await?;

    if interrupted(&result, &cancel) {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    if !result.is_success() {
        return Ok(ExitCode::FAILURE);
    }

    if cli.create_pr && !cli.dry_run {
        let publish = PublishOptions {
            branch: &cli.branch_name,
            base: &cli.base_branch,
            title: &cli.pr_title,
            body: &cli.pr_body,
        };
        commands::publish::run(&cli.output, &publish, github_token(), &cancel).await?;
        if cancel.is_cancelled() {
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// A Ctrl-C at any point before publishing counts, even one that landed
/// after the sync loop finished.
fn interrupted(result: &SyncResult, cancel: &CancelToken) -> bool {
    result.cancelled || cancel.is_cancelled()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
