use std::path::Path;
use std::sync::Arc;

use ghpick_download::{DownloadOutcome, Downloader};
use ghpick_fetch::ContentFetcher;
use ghpick_types::{ContentEntry, RepositoryId};
use tracing::{debug, info};

use crate::config::ExplorerConfig;
use crate::decoration::{Decorate, Decoration};
use crate::error::{TreeError, TreeResult};
use crate::materializer::TreeMaterializer;
use crate::node::{TreeItem, TreeNode};
use crate::notify::{ChangeNotifier, ChangeStream};
use crate::selection::SelectionEngine;
use crate::state::RepositoryState;

/// Entry point tying state, materialization, selection and notification
/// together around one shared [`RepositoryState`].
///
/// Construct one per browsing session and hand out references to it.
pub struct Explorer {
    state: Arc<RepositoryState>,
    materializer: TreeMaterializer,
    selection: SelectionEngine,
    notifier: ChangeNotifier,
    config: ExplorerConfig,
}

impl Explorer {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, config: ExplorerConfig) -> Self {
        let state = Arc::new(RepositoryState::new());
        let notifier = ChangeNotifier::new(config.channel_capacity);
        let materializer = TreeMaterializer::new(
            Arc::clone(&state),
            fetcher,
            notifier.clone(),
            config.clone(),
        );
        let selection = SelectionEngine::new(Arc::clone(&state), notifier.clone());
        Self {
            state,
            materializer,
            selection,
            notifier,
            config,
        }
    }

    pub fn with_defaults(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self::new(fetcher, ExplorerConfig::default())
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> ChangeStream {
        self.notifier.subscribe()
    }

    // ------------------------------------------------------------------
    // Repository
    // ------------------------------------------------------------------

    /// Browse `repo`. A different repository resets the tree, clears the
    /// selection and notifies; the current one is a no-op.
    pub fn set_repository(&self, repo: RepositoryId) -> bool {
        if !self.state.set_repository(repo.clone()) {
            return false;
        }
        info!(%repo, "repository set");
        self.selection.clear();
        self.notifier.tree_changed(None);
        true
    }

    pub fn repository(&self) -> Option<RepositoryId> {
        self.state.repository()
    }

    /// Drop cached data so it is fetched again on the next query.
    ///
    /// `None` resets the whole tree but keeps the repository and selection.
    /// A node drops its cached children, any pending load and every mapped
    /// descendant.
    pub fn refresh(&self, node: Option<&TreeNode>) {
        match node {
            None => {
                self.state.reset_state();
                self.notifier.tree_changed(None);
            }
            Some(node) => {
                let dir = node.path();
                self.state.update_item(dir, |n| n.children = None);
                self.state.delete_loading_promise(dir);
                let removed = self.state.remove_subtree(dir);
                debug!(path = %dir, removed, "refreshed subtree");
                self.notifier.tree_changed(Some(dir));
            }
        }
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    pub async fn get_children(&self, parent: Option<&TreeNode>) -> Vec<TreeItem> {
        self.materializer.get_children(parent).await
    }

    pub async fn load_root(&self) -> Vec<TreeItem> {
        self.materializer.load_root().await
    }

    pub async fn populate_subtree(&self, node: &TreeNode) -> Vec<TreeItem> {
        self.materializer.populate_subtree(node).await
    }

    pub fn get_parent(&self, node: &TreeNode) -> Option<TreeNode> {
        node.parent.as_deref().and_then(|p| self.state.item(p))
    }

    pub fn item(&self, path: &str) -> Option<TreeNode> {
        self.state.item(path)
    }

    pub fn decorate(&self, item: &TreeItem) -> Decoration {
        let selected = item.path().is_some_and(|p| self.selection.is_selected(p));
        item.decorate(selected)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn toggle(&self, path: &str) -> bool {
        self.selection.toggle(path)
    }

    pub fn toggle_recursive(&self, path: &str) -> usize {
        self.selection.toggle_recursive(path)
    }

    /// Directories toggle their known subtree; leaves toggle themselves.
    pub fn toggle_item(&self, node: &TreeNode) {
        if node.is_dir() {
            self.selection.toggle_recursive(node.path());
        } else {
            self.selection.toggle(node.path());
        }
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selection.is_selected(path)
    }

    pub fn selected(&self) -> Vec<String> {
        self.selection.list()
    }

    pub fn clear_selection(&self) -> bool {
        self.selection.clear()
    }

    pub fn select_many<I, S>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.select_many(paths)
    }

    /// Entries of the known nodes among `paths`; unknown paths are skipped.
    pub fn resolve_selected_entries(&self, paths: &[String]) -> Vec<ContentEntry> {
        let items = self.state.items();
        paths
            .iter()
            .filter_map(|p| match items.get(p) {
                Some(node) => Some(node.entry.clone()),
                None => {
                    debug!(path = %p, "selected path not loaded, skipping");
                    None
                }
            })
            .collect()
    }

    /// Hand the selected entries to `downloader`.
    pub async fn download_selected(
        &self,
        downloader: &dyn Downloader,
        destination: &Path,
    ) -> TreeResult<Vec<DownloadOutcome>> {
        let repo = self.state.repository().ok_or(TreeError::NoRepository)?;
        let entries = self.resolve_selected_entries(&self.selected());
        if entries.is_empty() {
            return Err(TreeError::EmptySelection);
        }
        info!(%repo, count = entries.len(), destination = %destination.display(), "downloading selection");
        Ok(downloader.download_many(&entries, destination, &repo).await)
    }
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("notifier", &self.notifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::Icon;
    use crate::notify::ChangeEvent;
    use async_trait::async_trait;
    use ghpick_download::LocalDownloader;
    use ghpick_fetch::InMemoryFetcher;
    use std::sync::Mutex;

    fn repo_a() -> RepositoryId {
        RepositoryId::new("test-owner", "test-repo").with_branch("main")
    }

    fn repo_b() -> RepositoryId {
        RepositoryId::new("other", "repo")
    }

    fn fetcher() -> Arc<InMemoryFetcher> {
        let f = InMemoryFetcher::with_repository(
            repo_a(),
            vec![
                ContentEntry::file("file1.txt", 5).with_inline_content("aGVsbG8=", Some("base64")),
                ContentEntry::dir("dir1"),
                ContentEntry::file("dir1/file2.ts", 9).with_inline_content("let x = 1", None),
            ],
        );
        f.insert_repository(repo_b(), vec![ContentEntry::file("other.md", 1)]);
        Arc::new(f)
    }

    fn explorer(f: &Arc<InMemoryFetcher>) -> Explorer {
        let e = Explorer::with_defaults(f.clone());
        e.set_repository(repo_a());
        e
    }

    fn paths(items: &[TreeItem]) -> Vec<&str> {
        items.iter().filter_map(TreeItem::path).collect()
    }

    // ------------------------------------------------------------------
    // Browsing
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn root_then_cached_directory() {
        let f = fetcher();
        let e = explorer(&f);

        assert_eq!(e.get_children(None).await, vec![TreeItem::Loading]);
        let roots = e.load_root().await;
        assert_eq!(paths(&roots), vec!["file1.txt", "dir1"]);

        let dir1 = e.item("dir1").unwrap();
        let children = e.get_children(Some(&dir1)).await;
        assert_eq!(paths(&children), vec!["dir1/file2.ts"]);
        assert_eq!(f.children_calls(), 0);
        assert_eq!(f.recursive_calls(), 1);

        let child = children[0].as_node().unwrap();
        assert_eq!(e.get_parent(child).unwrap().path(), "dir1");
        assert!(e.get_parent(&dir1).is_none());
    }

    #[tokio::test]
    async fn switching_repository_resets_tree_and_selection() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        e.toggle("file1.txt");
        let mut events = e.subscribe();

        assert!(e.set_repository(repo_b()));
        assert!(e.state().is_empty());
        assert!(e.state().root_items().is_none());
        assert!(e.selected().is_empty());
        assert_eq!(events.recv().await.unwrap(), ChangeEvent::Selection);
        assert_eq!(events.recv().await.unwrap(), ChangeEvent::Tree { scope: None });

        let roots = e.load_root().await;
        assert_eq!(paths(&roots), vec!["other.md"]);
    }

    #[tokio::test]
    async fn setting_current_repository_is_noop() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        e.toggle("file1.txt");
        let emitted = e.notifier().emitted();

        assert!(!e.set_repository(repo_a()));
        assert_eq!(e.state().len(), 3);
        assert!(e.is_selected("file1.txt"));
        assert_eq!(e.notifier().emitted(), emitted);
    }

    #[tokio::test]
    async fn refreshing_a_directory_refetches_it() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        let dir1 = e.item("dir1").unwrap();
        let mut events = e.subscribe();

        e.refresh(Some(&dir1));
        assert!(e.item("dir1/file2.ts").is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            ChangeEvent::Tree { scope: Some("dir1".into()) }
        );

        let children = e.get_children(Some(&dir1)).await;
        assert_eq!(paths(&children), vec!["dir1/file2.ts"]);
        assert_eq!(f.children_calls(), 1);
    }

    #[tokio::test]
    async fn full_refresh_reloads_root_and_keeps_selection() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        e.toggle("file1.txt");

        e.refresh(None);
        assert!(e.state().is_empty());
        assert_eq!(e.repository(), Some(repo_a()));
        assert!(e.is_selected("file1.txt"));

        e.load_root().await;
        assert_eq!(f.recursive_calls(), 2);
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn toggle_item_by_kind() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;

        e.toggle_item(&e.item("dir1").unwrap());
        assert_eq!(e.selected(), vec!["dir1", "dir1/file2.ts"]);
        e.toggle_item(&e.item("file1.txt").unwrap());
        assert!(e.is_selected("file1.txt"));

        assert_eq!(e.toggle_recursive(""), 3);
        assert!(e.selected().is_empty());
    }

    #[tokio::test]
    async fn decoration_reflects_selection() {
        let f = fetcher();
        let e = explorer(&f);
        let roots = e.load_root().await;
        e.toggle("file1.txt");
        assert_eq!(e.decorate(&roots[0]).icon, Icon::Check);
        assert_eq!(e.decorate(&roots[1]).icon, Icon::Folder);
        assert_eq!(e.decorate(&TreeItem::Loading).icon, Icon::Loading);
    }

    #[tokio::test]
    async fn resolve_skips_unknown_paths() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        let entries = e.resolve_selected_entries(&["dir1/file2.ts".into(), "missing".into()]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "file2.ts");
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn download_selected_writes_inline_content() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        e.toggle_recursive("");
        let dir = tempfile::tempdir().unwrap();

        let outcomes = e
            .download_selected(&LocalDownloader::new(), dir.path())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.success));
        assert_eq!(std::fs::read(dir.path().join("file1.txt")).unwrap(), b"hello");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("dir1/file2.ts")).unwrap(),
            "let x = 1"
        );
    }

    struct RecordingDownloader {
        seen: Mutex<Vec<(String, RepositoryId)>>,
    }

    #[async_trait]
    impl Downloader for RecordingDownloader {
        async fn download_many(
            &self,
            entries: &[ContentEntry],
            _destination: &Path,
            repo: &RepositoryId,
        ) -> Vec<DownloadOutcome> {
            let mut seen = self.seen.lock().unwrap();
            for entry in entries {
                seen.push((entry.path.clone(), repo.clone()));
            }
            entries.iter().cloned().map(DownloadOutcome::ok).collect()
        }
    }

    #[tokio::test]
    async fn download_receives_only_selected_entries() {
        let f = fetcher();
        let e = explorer(&f);
        e.load_root().await;
        e.toggle("dir1/file2.ts");
        let recorder = RecordingDownloader { seen: Mutex::new(Vec::new()) };

        e.download_selected(&recorder, Path::new("/unused")).await.unwrap();
        assert_eq!(*recorder.seen.lock().unwrap(), vec![("dir1/file2.ts".to_string(), repo_a())]);
    }

    #[tokio::test]
    async fn download_requires_repository_and_selection() {
        let f = fetcher();
        let recorder = RecordingDownloader { seen: Mutex::new(Vec::new()) };

        let bare = Explorer::with_defaults(f.clone());
        let err = bare.download_selected(&recorder, Path::new("/unused")).await.unwrap_err();
        assert!(matches!(err, TreeError::NoRepository));

        let e = explorer(&f);
        let err = e.download_selected(&recorder, Path::new("/unused")).await.unwrap_err();
        assert!(matches!(err, TreeError::EmptySelection));
    }

    #[test]
    fn debug_format() {
        let e = Explorer::with_defaults(fetcher());
        assert!(format!("{e:?}").contains("Explorer"));
    }
}
