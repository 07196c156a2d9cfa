use repo_sync_github::GitHubFetcher;

/// Probe GitHub and report the outcome. Returns true when reachable.
pub async fn run(fetcher: &GitHubFetcher) -> bool {
    tracing::info!("testing GitHub connectivity");
    let connected = fetcher.check_connection().await;

    if connected {
        println!("GitHub connectivity test passed");
    } else {
        eprintln!("GitHub connectivity test failed");
    }

    connected
}
