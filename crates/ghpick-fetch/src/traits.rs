use std::collections::HashSet;

use async_trait::async_trait;
use ghpick_types::{ContentEntry, FetchResult, RateLimit, RepositoryId};
use tracing::debug;

/// Source of remote repository listings.
///
/// Implementations must be thread-safe and must report every failure as a
/// [`FetchError`](ghpick_types::FetchError) rather than panicking. Each call
/// is expected to apply its own timeout; the tree core does not enforce one.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// List the immediate children of `path` (`""` for the repository root).
    async fn fetch_children(
        &self,
        repo: &RepositoryId,
        path: &str,
    ) -> FetchResult<Vec<ContentEntry>>;

    /// List every descendant of `path` up to `max_depth` levels below it.
    ///
    /// Depth 1 is the children of `path` itself. The result is flat and
    /// ordered so that a directory always precedes its contents.
    ///
    /// The default implementation walks the tree one level at a time through
    /// [`fetch_children`](Self::fetch_children) and stops at the first failed
    /// level. Backends with a native recursive listing should override it.
    async fn fetch_recursive(
        &self,
        repo: &RepositoryId,
        path: &str,
        max_depth: usize,
    ) -> FetchResult<Vec<ContentEntry>> {
        let mut collected = Vec::new();
        let mut visited = HashSet::new();
        let mut level = vec![path.to_string()];
        let mut depth = 1;

        while !level.is_empty() && depth <= max_depth {
            let mut next = Vec::new();
            for dir in level {
                if !visited.insert(dir.clone()) {
                    continue;
                }
                debug!(path = %dir, depth, max_depth, "fetching level");
                let entries = self.fetch_children(repo, &dir).await?;
                next.extend(entries.iter().filter(|e| e.is_dir()).map(|e| e.path.clone()));
                collected.extend(entries);
            }
            level = next;
            depth += 1;
        }

        debug!(path, max_depth, count = collected.len(), "recursive fetch complete");
        Ok(collected)
    }

    /// Last known API quota, if the backend tracks one.
    fn rate_limit(&self) -> Option<RateLimit> {
        None
    }
}
