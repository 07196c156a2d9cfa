use std::path::Path;

use anyhow::Result;
use repo_sync::{CancelToken, Fetcher, SyncOptions, SyncResult, Synchronizer};

use crate::config::SyncConfig;

/// Run the sync and print a summary to stdout, failures to stderr.
pub async fn run<F: Fetcher>(
    fetcher: F,
    config: &SyncConfig,
    output: &Path,
    options: SyncOptions,
    cancel: CancelToken,
) -> Result<SyncResult> {
    println!(
        "Syncing {} file(s) from {} source(s)...",
        config.file_count(),
        config.sources.len()
    );

    let result = Synchronizer::new(fetcher)
        .with_cancel_token(cancel)
        .sync(&config.sources, output, &config.rules, options)
        .await?;

    print_report(&result, output, options.dry_run);
    Ok(result)
}

fn print_report(result: &SyncResult, output: &Path, dry_run: bool) {
    if result.is_success() {
        println!("{result}");
    } else {
        eprintln!("{result}");
        for failure in &result.failures {
            eprintln!("  {}: {}", failure.identifier, failure.error);
        }
    }

    if result.cancelled {
        eprintln!("Sync interrupted before all files were processed");
    }

    if !dry_run && result.success_count() > 0 {
        let updated = result.written_paths().len();
        println!(
            "{updated} file(s) updated, {} unchanged, saved to {}",
            result.success_count() - updated,
            output.display()
        );
    }
}
