use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use ghpick_types::{ContentEntry, RepositoryId};

use crate::error::DownloadResult;

/// Result of retrieving one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub entry: ContentEntry,
    pub success: bool,
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn ok(entry: ContentEntry) -> Self {
        Self {
            entry,
            success: true,
            error: None,
        }
    }

    pub fn failed(entry: ContentEntry, error: impl ToString) -> Self {
        Self {
            entry,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Success and failure counts over a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl DownloadSummary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Writes a batch of entries below a destination directory.
///
/// Implementations report every entry exactly once and never abort the batch
/// because one entry failed.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download_many(
        &self,
        entries: &[ContentEntry],
        destination: &Path,
        repo: &RepositoryId,
    ) -> Vec<DownloadOutcome>;
}

/// Fetches the raw bytes behind a download URL.
#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn fetch_blob(
        &self,
        repo: &RepositoryId,
        entry: &ContentEntry,
        url: &str,
    ) -> DownloadResult<Bytes>;
}
