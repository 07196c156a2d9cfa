use std::collections::HashMap;
use std::sync::Mutex;

use crate::fetch::{FetchError, Fetcher};
use crate::source::file_id;

/// In-memory fetcher for testing. Serves registered files and records every
/// request it receives.
#[derive(Default)]
pub struct InMemoryFetcher {
    files: HashMap<String, Vec<u8>>,
    failures: HashMap<String, FetchError>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, repository: &str, reference: &str, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .insert(file_id(repository, reference, path), content.into());
    }

    /// Make requests for this file fail with `error` instead of `NotFound`.
    pub fn fail(&mut self, repository: &str, reference: &str, path: &str, error: FetchError) {
        self.failures
            .insert(file_id(repository, reference, path), error);
    }

    /// Identifiers requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Fetcher for InMemoryFetcher {
    async fn fetch(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let id = file_id(repository, reference, path);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(id.clone());
        }

        if let Some(error) = self.failures.get(&id) {
            return Err(error.clone());
        }

        self.files.get(&id).cloned().ok_or_else(|| FetchError::NotFound {
            id,
            reason: "not registered".into(),
        })
    }
}
