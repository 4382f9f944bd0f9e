use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use ghpick_types::{path, ContentEntry, FetchError, FetchResult, RateLimit, RepositoryId};
use tracing::{debug, warn};

use crate::traits::ContentFetcher;

/// In-memory content fetcher backed by flat per-repository listings.
///
/// Intended for tests, demos and offline snapshots. Every call yields to the
/// runtime once before answering, so concurrent callers interleave the way
/// they would against a real network backend. Call counters and per-path
/// failure injection make the fetcher usable as a test double.
pub struct InMemoryFetcher {
    repos: RwLock<HashMap<RepositoryId, Vec<ContentEntry>>>,
    failures: RwLock<HashMap<String, FetchError>>,
    rate_limit: RwLock<Option<RateLimit>>,
    entry_limit: Option<usize>,
    children_calls: AtomicUsize,
    recursive_calls: AtomicUsize,
}

impl InMemoryFetcher {
    /// Create a fetcher that knows no repositories.
    pub fn new() -> Self {
        Self {
            repos: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            rate_limit: RwLock::new(None),
            entry_limit: None,
            children_calls: AtomicUsize::new(0),
            recursive_calls: AtomicUsize::new(0),
        }
    }

    /// Create a fetcher serving one repository.
    pub fn with_repository(repo: RepositoryId, entries: Vec<ContentEntry>) -> Self {
        let fetcher = Self::new();
        fetcher.insert_repository(repo, entries);
        fetcher
    }

    /// Cap recursive listings at `limit` entries, like a remote that truncates.
    pub fn with_entry_limit(mut self, limit: usize) -> Self {
        self.entry_limit = Some(limit);
        self
    }

    /// Register (or replace) the flat listing of a repository.
    pub fn insert_repository(&self, repo: RepositoryId, entries: Vec<ContentEntry>) {
        self.repos
            .write()
            .expect("repos lock poisoned")
            .insert(repo, entries);
    }

    /// Make every fetch rooted at `path` fail with `error` until cleared.
    pub fn fail_path(&self, path: &str, error: FetchError) {
        self.failures
            .write()
            .expect("failures lock poisoned")
            .insert(path.to_string(), error);
    }

    pub fn clear_failure(&self, path: &str) {
        self.failures
            .write()
            .expect("failures lock poisoned")
            .remove(path);
    }

    pub fn set_rate_limit(&self, rate_limit: Option<RateLimit>) {
        *self.rate_limit.write().expect("rate limit lock poisoned") = rate_limit;
    }

    /// Number of `fetch_children` calls served so far.
    pub fn children_calls(&self) -> usize {
        self.children_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_recursive` calls served so far.
    pub fn recursive_calls(&self) -> usize {
        self.recursive_calls.load(Ordering::SeqCst)
    }

    /// Look up the listing of `repo` and check that `dir` names a directory in it.
    fn listing(&self, repo: &RepositoryId, dir: &str) -> FetchResult<Vec<ContentEntry>> {
        if let Some(err) = self
            .failures
            .read()
            .expect("failures lock poisoned")
            .get(dir)
        {
            return Err(err.clone());
        }

        let repos = self.repos.read().expect("repos lock poisoned");
        let entries = repos.get(repo).ok_or_else(|| {
            FetchError::with_status(
                format!("repository not found: {repo}"),
                ghpick_types::FetchStatus::NotFound,
            )
        })?;
        if !path::is_root(dir) && !entries.iter().any(|e| e.path == dir && e.is_dir()) {
            return Err(FetchError::not_found(dir));
        }
        Ok(entries.clone())
    }
}

impl Default for InMemoryFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for InMemoryFetcher {
    async fn fetch_children(
        &self,
        repo: &RepositoryId,
        dir: &str,
    ) -> FetchResult<Vec<ContentEntry>> {
        tokio::task::yield_now().await;
        self.children_calls.fetch_add(1, Ordering::SeqCst);

        let children: Vec<ContentEntry> = self
            .listing(repo, dir)?
            .into_iter()
            .filter(|e| path::is_direct_child(dir, &e.path))
            .collect();
        debug!(%repo, path = dir, count = children.len(), "served children");
        Ok(children)
    }

    async fn fetch_recursive(
        &self,
        repo: &RepositoryId,
        dir: &str,
        max_depth: usize,
    ) -> FetchResult<Vec<ContentEntry>> {
        tokio::task::yield_now().await;
        self.recursive_calls.fetch_add(1, Ordering::SeqCst);

        let base = path::depth(dir);
        let mut found: Vec<ContentEntry> = self
            .listing(repo, dir)?
            .into_iter()
            .filter(|e| path::is_descendant(dir, &e.path) && e.depth() - base <= max_depth)
            .collect();
        // Stable: siblings keep listing order, parents precede children.
        found.sort_by_key(|e| e.depth());

        if let Some(limit) = self.entry_limit {
            if found.len() > limit {
                warn!(%repo, path = dir, total = found.len(), limit, "recursive listing truncated");
                found.truncate(limit);
            }
        }
        debug!(%repo, path = dir, max_depth, count = found.len(), "served recursive listing");
        Ok(found)
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        *self.rate_limit.read().expect("rate limit lock poisoned")
    }
}

impl std::fmt::Debug for InMemoryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repos = self.repos.read().expect("repos lock poisoned").len();
        f.debug_struct("InMemoryFetcher")
            .field("repositories", &repos)
            .field("children_calls", &self.children_calls())
            .field("recursive_calls", &self.recursive_calls())
            .finish()
    }
}
