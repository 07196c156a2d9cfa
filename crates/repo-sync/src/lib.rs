pub mod cancel;
pub mod fetch;
pub mod rule;
pub mod source;
pub mod substitute;
pub mod sync;
pub mod write;

pub use cancel::CancelToken;
pub use fetch::{FetchError, Fetcher};
pub use rule::{InvalidFlag, RuleFlags, SubstitutionRule};
pub use source::SourceSpec;
pub use substitute::{rewrite_group_references, substitute, substitute_text};
pub use sync::{
    FileFailure, FileSuccess, Outcome, SyncError, SyncOptions, SyncOutcome, SyncResult,
    Synchronizer, destination_path,
};
pub use write::{WriteError, WriteOutcome, write_if_changed};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
