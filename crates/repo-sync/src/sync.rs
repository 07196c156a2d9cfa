use std::fmt;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::fetch::{FetchError, Fetcher};
use crate::rule::SubstitutionRule;
use crate::source::SourceSpec;
use crate::substitute::substitute;
use crate::write::{WriteError, write_if_changed};

/// Errors that abort a sync as a whole. Per-file problems never surface
/// here; they are recorded as failures in the [`SyncResult`].
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("write task failed: {0}")]
    WriteTask(#[from] tokio::task::JoinError),

    #[error("path has no file name: {0}")]
    InvalidPath(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Log what would be downloaded without fetching or writing anything.
    pub dry_run: bool,
    /// Nest files under `owner_name/` mirroring their repository path
    /// instead of flattening them by base name.
    pub preserve_structure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `bytes` is the fetched length, before substitution.
    Success { bytes: u64, write_skipped: bool },
    Failure { error: String },
}

/// The result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// `repo:ref:path`
    pub identifier: String,
    pub destination: Option<PathBuf>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSuccess {
    pub identifier: String,
    pub destination: Option<PathBuf>,
    pub bytes: u64,
    pub write_skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub identifier: String,
    pub error: String,
}

/// Aggregated outcomes of a sync, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub successes: Vec<FileSuccess>,
    pub failures: Vec<FileFailure>,
    /// Sum of fetched byte lengths, whether or not the file was rewritten.
    pub total_bytes: u64,
    /// Set when the sync stopped early because of a cancellation request.
    pub cancelled: bool,
}

impl SyncResult {
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome.outcome {
            Outcome::Success {
                bytes,
                write_skipped,
            } => {
                self.total_bytes += bytes;
                self.successes.push(FileSuccess {
                    identifier: outcome.identifier,
                    destination: outcome.destination,
                    bytes,
                    write_skipped,
                });
            }
            Outcome::Failure { error } => self.failures.push(FileFailure {
                identifier: outcome.identifier,
                error,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Destinations that were actually rewritten on disk.
    pub fn written_paths(&self) -> Vec<&Path> {
        self.successes
            .iter()
            .filter(|s| !s.write_skipped)
            .filter_map(|s| s.destination.as_deref())
            .collect()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sync completed: {} successful, {} failed, {} bytes downloaded",
            self.success_count(),
            self.failure_count(),
            self.total_bytes
        )
    }
}

/// Where a file from `source` lands under `output_root`.
///
/// Flattened output keeps only the base name, so two sources providing the
/// same file name write to the same destination and the last one wins.
/// Returns `None` for paths with no usable file name.
pub fn destination_path(
    output_root: &Path,
    source: &SourceSpec,
    path: &str,
    preserve_structure: bool,
) -> Option<PathBuf> {
    if preserve_structure {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        Some(output_root.join(source.directory_name()).join(relative))
    } else {
        Path::new(path).file_name().map(|name| output_root.join(name))
    }
}

/// Drives fetch, substitution and write for every configured file.
///
/// Files are processed one at a time in declaration order, so the returned
/// [`SyncResult`] is deterministic.
pub struct Synchronizer<F> {
    fetcher: F,
    cancel: CancelToken,
}

impl<F: Fetcher> Synchronizer<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn sync(
        &self,
        sources: &[SourceSpec],
        output_root: &Path,
        rules: &[SubstitutionRule],
        options: SyncOptions,
    ) -> Result<SyncResult, SyncError> {
        tracing::info!(output = %output_root.display(), "starting sync");

        if options.dry_run {
            tracing::info!("dry run: no files will be downloaded");
        } else {
            tokio::fs::create_dir_all(output_root)
                .await
                .map_err(|source| SyncError::OutputRoot {
                    path: output_root.to_path_buf(),
                    source,
                })?;
        }

        if !rules.is_empty() {
            tracing::info!("using {} substitution rule(s)", rules.len());
        }

        let mut result = SyncResult::default();

        'sources: for source in sources {
            tracing::info!(
                repo = %source.repository,
                reference = %source.reference,
                files = source.files.len(),
                "processing source"
            );

            for path in &source.files {
                if self.cancel.is_cancelled() {
                    tracing::warn!("sync cancelled, remaining files skipped");
                    result.cancelled = true;
                    break 'sources;
                }

                let outcome = self
                    .sync_file(source, path, output_root, rules, options)
                    .await;
                result.record(outcome);
            }
        }

        if !result.cancelled && self.cancel.is_cancelled() {
            tracing::warn!("sync cancelled while the last file was in flight");
            result.cancelled = true;
        }

        tracing::info!("{result}");
        Ok(result)
    }

    async fn sync_file(
        &self,
        source: &SourceSpec,
        path: &str,
        output_root: &Path,
        rules: &[SubstitutionRule],
        options: SyncOptions,
    ) -> SyncOutcome {
        let identifier = source.file_id(path);
        let destination = destination_path(output_root, source, path, options.preserve_structure);

        if options.dry_run {
            tracing::info!("would download {identifier}");
            return SyncOutcome {
                identifier,
                destination,
                outcome: Outcome::Success {
                    bytes: 0,
                    write_skipped: true,
                },
            };
        }

        let outcome = match &destination {
            None => {
                let error = FileError::InvalidPath(path.to_owned());
                tracing::error!("failed to download {identifier}: {error}");
                Outcome::Failure {
                    error: error.to_string(),
                }
            }
            Some(destination) => match self.process(source, path, destination, rules).await {
                Ok((bytes, written)) => {
                    if written {
                        tracing::info!("downloaded {identifier} -> {}", destination.display());
                    } else {
                        tracing::info!(
                            "skipped {identifier} -> {} (identical content)",
                            destination.display()
                        );
                    }
                    Outcome::Success {
                        bytes,
                        write_skipped: !written,
                    }
                }
                Err(error) => {
                    tracing::error!("failed to download {identifier}: {error}");
                    Outcome::Failure {
                        error: error.to_string(),
                    }
                }
            },
        };

        SyncOutcome {
            identifier,
            destination,
            outcome,
        }
    }

    async fn process(
        &self,
        source: &SourceSpec,
        path: &str,
        destination: &Path,
        rules: &[SubstitutionRule],
    ) -> Result<(u64, bool), FileError> {
        let content = self
            .fetcher
            .fetch(&source.repository, &source.reference, path)
            .await?;
        let fetched = content.len() as u64;

        let content = substitute(&content, rules);
        let destination = destination.to_path_buf();
        let outcome =
            tokio::task::spawn_blocking(move || write_if_changed(&content, &destination)).await??;

        Ok((fetched, outcome.written))
    }
}
