use std::path::{Path, PathBuf};

/// Errors that can occur while writing synced content to disk.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// False when the destination already held identical bytes.
    pub written: bool,
}

/// Write `content` to `destination` unless the file already holds exactly
/// these bytes. Parent directories are created as needed.
///
/// Skipping identical content keeps modification times stable so version
/// control sees no change.
pub fn write_if_changed(content: &[u8], destination: &Path) -> Result<WriteOutcome, WriteError> {
    if is_identical(content, destination) {
        tracing::debug!(path = %destination.display(), "content unchanged, skipping write");
        return Ok(WriteOutcome { written: false });
    }

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(destination, content).map_err(|source| WriteError::Write {
        path: destination.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %destination.display(), bytes = content.len(), "saved file");
    Ok(WriteOutcome { written: true })
}

fn is_identical(content: &[u8], destination: &Path) -> bool {
    let same_len = std::fs::metadata(destination)
        .is_ok_and(|m| m.is_file() && m.len() == content.len() as u64);

    same_len && std::fs::read(destination).is_ok_and(|existing| existing == content)
}
