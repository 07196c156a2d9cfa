/// A repository pinned at a reference, plus the files to pull from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// `owner/name`
    pub repository: String,
    /// Branch, tag, or commit hash.
    pub reference: String,
    pub files: Vec<String>,
}

impl SourceSpec {
    pub fn new(
        repository: impl Into<String>,
        reference: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            reference: reference.into(),
            files,
        }
    }

    /// Identifier used in logs and sync results: `repo:ref:path`.
    pub fn file_id(&self, path: &str) -> String {
        file_id(&self.repository, &self.reference, path)
    }

    /// Directory name used when the repository structure is preserved on disk.
    /// The owner/name separator is replaced so the result is a single path segment.
    pub fn directory_name(&self) -> String {
        self.repository.replace('/', "_")
    }
}

pub fn file_id(repository: &str, reference: &str, path: &str) -> String {
    format!("{repository}:{reference}:{path}")
}
