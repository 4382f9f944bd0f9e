use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ghpick_types::{ContentEntry, ContentSource, RepositoryId};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::{DownloadError, DownloadResult};
use crate::traits::{BlobSource, DownloadOutcome, Downloader};

/// Default number of files written concurrently.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Resolve a repository path below `root`, refusing anything that escapes it.
pub fn safe_join(root: &Path, entry_path: &str) -> DownloadResult<PathBuf> {
    let relative = Path::new(entry_path);
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DownloadError::UnsafePath(entry_path.to_string()))
            }
        }
    }
    if depth == 0 {
        return Err(DownloadError::UnsafePath(entry_path.to_string()));
    }
    Ok(joined)
}

/// Filesystem [`Downloader`].
///
/// Directories are created first, then files are written with at most
/// `max_concurrent` in flight. Outcomes are returned in input order.
pub struct LocalDownloader {
    blobs: Option<Arc<dyn BlobSource>>,
    max_concurrent: usize,
}

impl LocalDownloader {
    /// A downloader that can only write inline content.
    pub fn new() -> Self {
        Self {
            blobs: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_blob_source(mut self, blobs: Arc<dyn BlobSource>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

impl Default for LocalDownloader {
    fn default() -> Self {
        Self::new()
    }
}

async fn resolve_bytes(
    blobs: Option<&dyn BlobSource>,
    repo: &RepositoryId,
    entry: &ContentEntry,
) -> DownloadResult<Bytes> {
    match &entry.source {
        Some(ContentSource::Inline { .. }) => Ok(Bytes::from(entry.decode_inline()?)),
        Some(ContentSource::Download(url)) => match blobs {
            Some(blobs) => blobs.fetch_blob(repo, entry, url).await,
            None => Err(DownloadError::NoContent(entry.path.clone())),
        },
        None => Err(DownloadError::NoContent(entry.path.clone())),
    }
}

async fn write_file(
    blobs: Option<Arc<dyn BlobSource>>,
    repo: RepositoryId,
    entry: ContentEntry,
    destination: PathBuf,
) -> DownloadResult<()> {
    let target = safe_join(&destination, &entry.path)?;
    let bytes = resolve_bytes(blobs.as_deref(), &repo, &entry).await?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, &bytes).await?;
    debug!(path = %entry.path, bytes = bytes.len(), "wrote file");
    Ok(())
}

#[async_trait]
impl Downloader for LocalDownloader {
    async fn download_many(
        &self,
        entries: &[ContentEntry],
        destination: &Path,
        repo: &RepositoryId,
    ) -> Vec<DownloadOutcome> {
        let mut outcomes: Vec<Option<DownloadOutcome>> = vec![None; entries.len()];

        for (idx, entry) in entries.iter().enumerate().filter(|(_, e)| e.is_dir()) {
            let result = match safe_join(destination, &entry.path) {
                Ok(target) => tokio::fs::create_dir_all(&target).await.map_err(DownloadError::from),
                Err(e) => Err(e),
            };
            outcomes[idx] = Some(match result {
                Ok(()) => DownloadOutcome::ok(entry.clone()),
                Err(e) => {
                    error!(path = %entry.path, error = %e, "failed to create directory");
                    DownloadOutcome::failed(entry.clone(), e)
                }
            });
        }

        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for (idx, entry) in entries.iter().enumerate().filter(|(_, e)| !e.is_dir()) {
            let permits = Arc::clone(&permits);
            let blobs = self.blobs.clone();
            let repo = repo.clone();
            let entry = entry.clone();
            let destination = destination.to_path_buf();
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => write_file(blobs, repo, entry, destination).await,
                    Err(_) => Err(DownloadError::Io(std::io::Error::other("download pool closed"))),
                };
                (idx, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(()))) => outcomes[idx] = Some(DownloadOutcome::ok(entries[idx].clone())),
                Ok((idx, Err(e))) => {
                    error!(path = %entries[idx].path, error = %e, "failed to download");
                    outcomes[idx] = Some(DownloadOutcome::failed(entries[idx].clone(), e));
                }
                Err(e) => error!(error = %e, "download task aborted"),
            }
        }

        let outcomes: Vec<DownloadOutcome> = outcomes
            .into_iter()
            .zip(entries)
            .map(|(outcome, entry)| {
                outcome.unwrap_or_else(|| DownloadOutcome::failed(entry.clone(), "download task aborted"))
            })
            .collect();
        let failed = outcomes.iter().filter(|o| !o.success).count();
        info!(
            total = outcomes.len(),
            failed,
            destination = %destination.display(),
            "download batch finished"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn repo() -> RepositoryId {
        RepositoryId::new("o", "r")
    }

    struct CountingBlobs {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl BlobSource for CountingBlobs {
        async fn fetch_blob(
            &self,
            _repo: &RepositoryId,
            entry: &ContentEntry,
            url: &str,
        ) -> DownloadResult<Bytes> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if url.ends_with("/broken") {
                return Err(DownloadError::Blob {
                    path: entry.path.clone(),
                    reason: "404".into(),
                });
            }
            Ok(Bytes::from(format!("from {url}")))
        }
    }

    #[test]
    fn safe_join_rejects_escapes() {
        let root = Path::new("/tmp/dest");
        assert_eq!(safe_join(root, "a/b.txt").unwrap(), root.join("a").join("b.txt"));
        for bad in ["../x", "a/../../x", "/etc/passwd", "", "."] {
            assert!(safe_join(root, bad).is_err(), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn writes_inline_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            ContentEntry::file("docs/readme.md", 5).with_inline_content("aGVsbG8=", Some("base64")),
            ContentEntry::dir("empty"),
        ];
        let outcomes = LocalDownloader::new()
            .download_many(&entries, dir.path(), &repo())
            .await;

        assert!(outcomes.iter().all(|o| o.success));
        assert_eq!(outcomes[0].entry.path, "docs/readme.md");
        let written = std::fs::read(dir.path().join("docs/readme.md")).unwrap();
        assert_eq!(written, b"hello");
        assert!(dir.path().join("empty").is_dir());
    }

    #[tokio::test]
    async fn url_content_without_blob_source_fails_alone() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            ContentEntry::file("a.txt", 1).with_download_url("https://raw.example/a.txt"),
            ContentEntry::file("b.txt", 1).with_inline_content("b", None),
        ];
        let outcomes = LocalDownloader::new()
            .download_many(&entries, dir.path(), &repo())
            .await;

        assert!(!outcomes[0].success);
        assert!(outcomes[0].error.as_deref().unwrap().contains("no content"));
        assert!(outcomes[1].success);
    }

    #[tokio::test]
    async fn unsafe_paths_are_reported_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![ContentEntry::file("../escape.txt", 1).with_inline_content("x", None)];
        let outcomes = LocalDownloader::new()
            .download_many(&entries, dir.path(), &repo())
            .await;
        assert!(!outcomes[0].success);
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn blob_fetches_respect_concurrency_bound() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(CountingBlobs {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let entries: Vec<ContentEntry> = (0..8)
            .map(|i| {
                ContentEntry::file(&format!("f{i}.txt"), 1)
                    .with_download_url(format!("https://raw.example/f{i}"))
            })
            .collect();
        let downloader = LocalDownloader::new()
            .with_blob_source(blobs.clone())
            .with_max_concurrent(2);

        let outcomes = downloader.download_many(&entries, dir.path(), &repo()).await;

        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(|o| o.success));
        assert!(blobs.peak.load(Ordering::SeqCst) <= 2);
        let body = std::fs::read_to_string(dir.path().join("f3.txt")).unwrap();
        assert_eq!(body, "from https://raw.example/f3");
    }

    #[tokio::test]
    async fn blob_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(CountingBlobs {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let entries = vec![
            ContentEntry::file("ok.txt", 1).with_download_url("https://raw.example/ok"),
            ContentEntry::file("bad.txt", 1).with_download_url("https://raw.example/broken"),
        ];
        let outcomes = LocalDownloader::new()
            .with_blob_source(blobs)
            .download_many(&entries, dir.path(), &repo())
            .await;
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
    }

    #[test]
    fn max_concurrent_is_at_least_one() {
        assert_eq!(LocalDownloader::new().with_max_concurrent(0).max_concurrent(), 1);
        assert_eq!(LocalDownloader::default().max_concurrent(), DEFAULT_MAX_CONCURRENT);
    }
}
