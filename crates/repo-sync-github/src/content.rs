use base64::Engine;
use serde::Deserialize;

use repo_sync::FetchError;

/// Response from GitHub's Contents API.
/// `GET /repos/{owner}/{repo}/contents/{path}?ref={ref}`
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub content: Option<String>,
    pub encoding: Option<String>,
}

impl ContentResponse {
    /// Decode the base64 `content` field into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        match self.encoding.as_deref() {
            Some("base64") => {}
            other => {
                return Err(FetchError::Decode(format!(
                    "unexpected encoding: {}",
                    other.unwrap_or("none")
                )));
            }
        }

        let encoded = self
            .content
            .as_deref()
            .ok_or_else(|| FetchError::Decode("no content in response".into()))?;

        // GitHub returns base64 with newlines embedded
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

        base64::engine::general_purpose::STANDARD
            .decode(&cleaned)
            .map_err(|e| FetchError::Decode(format!("base64 decode failed: {e}")))
    }
}
