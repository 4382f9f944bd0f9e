//! Lazy construction of the node map from remote listings.
//!
//! Two strategies feed the same map:
//!
//! - the first root query issues one bounded-depth recursive listing in a
//!   background task and answers with a [`TreeItem::Loading`] placeholder;
//! - a directory whose children are not known yet is fetched one level at a
//!   time, with concurrent requests for the same directory sharing one fetch.
//!
//! Both go through [`TreeMaterializer::merge_entries`], which never replaces
//! a node that is already mapped.

use std::collections::HashSet;
use std::sync::Arc;

use ghpick_fetch::ContentFetcher;
use ghpick_types::{path, ContentEntry, RepositoryId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::config::ExplorerConfig;
use crate::node::{TreeItem, TreeNode};
use crate::notify::ChangeNotifier;
use crate::state::RepositoryState;

/// Builds tree nodes on demand. Cheap to clone.
#[derive(Clone)]
pub struct TreeMaterializer {
    state: Arc<RepositoryState>,
    fetcher: Arc<dyn ContentFetcher>,
    notifier: ChangeNotifier,
    config: ExplorerConfig,
}

impl TreeMaterializer {
    pub fn new(
        state: Arc<RepositoryState>,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: ChangeNotifier,
        config: ExplorerConfig,
    ) -> Self {
        Self {
            state,
            fetcher,
            notifier,
            config,
        }
    }

    /// Children of `parent`, or the root rows for `None`.
    ///
    /// The first root query starts the bulk load in a spawned task and
    /// returns a single loading placeholder; the notifier fires once the load
    /// settles. Must be called from within a tokio runtime.
    pub async fn get_children(&self, parent: Option<&TreeNode>) -> Vec<TreeItem> {
        match parent {
            None => self.root_children(),
            Some(node) if node.is_dir() => self.load_children(node.path()).await,
            Some(_) => Vec::new(),
        }
    }

    fn root_children(&self) -> Vec<TreeItem> {
        if let Some(items) = self.state.root_items() {
            return items;
        }
        if self.state.repository().is_none() {
            return Vec::new();
        }
        if self.state.try_begin_root_load() {
            let this = self.clone();
            tokio::spawn(async move { this.run_root_load().await });
        }
        vec![TreeItem::Loading]
    }

    /// Load the root rows and wait for them.
    ///
    /// Joins a load already running instead of starting a second one. The
    /// load runs in its own task, so dropping the returned future leaves it
    /// to finish and notify.
    pub async fn load_root(&self) -> Vec<TreeItem> {
        let mut events = self.notifier.subscribe();
        loop {
            if self.state.repository().is_none() {
                return Vec::new();
            }
            if let Some(items) = self.state.root_items() {
                return items;
            }
            if self.state.try_begin_root_load() {
                let this = self.clone();
                tokio::spawn(async move { this.run_root_load().await });
            }
            if let Err(RecvError::Closed) = events.recv().await {
                return vec![TreeItem::Loading];
            }
        }
    }

    /// Wait until no root load is running in the current epoch.
    async fn root_settled(&self) {
        let mut events = self.notifier.subscribe();
        let epoch = self.state.epoch();
        while self.state.is_root_loading() && self.state.epoch() == epoch {
            if let Err(RecvError::Closed) = events.recv().await {
                return;
            }
        }
    }

    async fn run_root_load(&self) {
        let Some(repo) = self.state.repository() else {
            self.state.set_root_loading(false);
            return;
        };
        let epoch = self.state.epoch();
        let depth = self.config.initial_load_depth;
        info!(%repo, depth, "loading repository root");

        let result = self.fetcher.fetch_recursive(&repo, path::ROOT_PATH, depth).await;

        if self.state.epoch() != epoch {
            warn!(%repo, "discarding root listing of a superseded load");
            return;
        }
        match result {
            Ok(entries) => {
                let count = entries.len();
                self.merge_entries(entries, None);
                let roots: Vec<TreeItem> = self
                    .state
                    .items()
                    .values()
                    .filter(|n| n.parent.is_none() && path::depth(n.path()) == 1)
                    .cloned()
                    .map(TreeItem::Node)
                    .collect();
                info!(%repo, entries = count, roots = roots.len(), "repository root loaded");
                self.state.set_root_items(Some(roots));
            }
            Err(e) => {
                error!(%repo, error = %e, "failed to load repository root");
                self.state.clear_item_map();
                self.state.set_root_items(Some(vec![TreeItem::Error(e)]));
            }
        }
        self.state.set_root_loading(false);
        self.notifier.tree_changed(None);
    }

    async fn load_children(&self, dir: &str) -> Vec<TreeItem> {
        let Some(repo) = self.state.repository() else {
            return Vec::new();
        };

        // The bulk root listing may already cover this directory.
        if self.state.is_root_loading() {
            debug!(path = %dir, "waiting for root load");
            self.root_settled().await;
        }

        if let Some(cached) = self.cached_children(dir) {
            debug!(path = %dir, count = cached.len(), "children served from cache");
            return cached.into_iter().map(TreeItem::Node).collect();
        }

        let (load, created) = self.state.pending_or_insert(dir);
        if !created {
            debug!(path = %dir, "joining in-flight load");
        }
        let epoch = self.state.epoch();
        let items = load
            .get_or_init(|| self.fetch_directory(repo, dir, epoch))
            .await
            .clone();
        self.state.settle_loading_promise(dir, &load);
        items
    }

    /// Children already known for `dir`: the cached child list, else the
    /// mapped nodes found by prefix.
    fn cached_children(&self, dir: &str) -> Option<Vec<TreeNode>> {
        let node = self.state.item(dir)?;
        if let Some(keys) = node.children {
            let items = self.state.items();
            let mut nodes: Vec<TreeNode> = keys.iter().filter_map(|k| items.get(k).cloned()).collect();
            nodes.sort_by(TreeNode::display_order);
            return Some(nodes);
        }
        let nodes = self.state.children_of(dir);
        (!nodes.is_empty()).then_some(nodes)
    }

    async fn fetch_directory(&self, repo: RepositoryId, dir: &str, epoch: u64) -> Vec<TreeItem> {
        debug!(%repo, path = %dir, "fetching children");
        match self.fetcher.fetch_children(&repo, dir).await {
            Ok(entries) => {
                if self.state.epoch() != epoch {
                    warn!(%repo, path = %dir, "discarding children of a superseded load");
                    return vec![TreeItem::Loading];
                }
                let mut nodes = self.merge_entries(entries, Some(dir));
                let keys = nodes.iter().map(|n| n.path().to_string()).collect();
                self.state.update_item(dir, |n| n.children = Some(keys));
                nodes.sort_by(TreeNode::display_order);
                nodes.into_iter().map(TreeItem::Node).collect()
            }
            Err(e) => {
                error!(%repo, path = %dir, error = %e, "failed to fetch children");
                vec![TreeItem::Error(e)]
            }
        }
    }

    /// Load up to `recursive_load_depth` levels below `node` in one call.
    ///
    /// Returns the direct children of `node` afterwards and fires one scoped
    /// tree notification on success.
    pub async fn populate_subtree(&self, node: &TreeNode) -> Vec<TreeItem> {
        if !node.is_dir() {
            return Vec::new();
        }
        let Some(repo) = self.state.repository() else {
            return Vec::new();
        };
        let dir = node.path();
        let epoch = self.state.epoch();
        let depth = self.config.recursive_load_depth;
        info!(%repo, path = %dir, depth, "populating subtree");

        match self.fetcher.fetch_recursive(&repo, dir, depth).await {
            Ok(entries) => {
                if self.state.epoch() != epoch {
                    warn!(%repo, path = %dir, "discarding subtree of a superseded load");
                    return Vec::new();
                }
                self.merge_entries(entries, None);
                let children = self.state.children_of(dir);
                let keys = children.iter().map(|n| n.path().to_string()).collect();
                self.state.update_item(dir, |n| n.children = Some(keys));
                self.notifier.tree_changed(Some(dir));
                children.into_iter().map(TreeItem::Node).collect()
            }
            Err(e) => {
                error!(%repo, path = %dir, error = %e, "failed to populate subtree");
                vec![TreeItem::Error(e)]
            }
        }
    }

    /// Insert `entries` into the node map.
    ///
    /// The parent is `parent` when given, else the mapped node at the entry's
    /// parent path. Entries already mapped are returned unchanged. Orphans
    /// from this or an earlier batch are linked once their parent is
    /// inserted; until then they stay mapped without a parent.
    pub fn merge_entries(&self, entries: Vec<ContentEntry>, parent: Option<&str>) -> Vec<TreeNode> {
        let explicit = parent.filter(|p| !path::is_root(p));
        let mut items = self.state.items_mut();
        let mut merged = Vec::with_capacity(entries.len());
        let mut inserted = HashSet::new();
        let mut unlinked = Vec::new();

        for entry in entries {
            if items.contains_key(&entry.path) {
                merged.push(entry.path);
                continue;
            }
            let parent_path = match explicit {
                Some(p) => Some(p.to_string()),
                None => match entry.parent_path() {
                    Some(p) if items.contains_key(p) => Some(p.to_string()),
                    Some(_) => {
                        unlinked.push(entry.path.clone());
                        None
                    }
                    None => None,
                },
            };
            let key = entry.path.clone();
            items.insert(key.clone(), TreeNode::new(entry, parent_path));
            inserted.insert(key.clone());
            merged.push(key);
        }

        let mut adopted = 0usize;
        if !inserted.is_empty() {
            for node in items.values_mut().filter(|n| n.parent.is_none()) {
                let found = path::parent_of(node.path())
                    .filter(|p| inserted.contains(*p))
                    .map(str::to_string);
                if found.is_some() {
                    node.parent = found;
                    adopted += 1;
                }
            }
        }
        for child in unlinked {
            if items.get(&child).is_some_and(|n| n.parent.is_none()) {
                warn!(path = %child, "parent not found, node left orphaned");
            }
        }

        debug!(inserted = inserted.len(), adopted, total = merged.len(), "merged entries");
        merged
            .iter()
            .filter_map(|k| items.get(k).cloned())
            .collect()
    }
}

impl std::fmt::Debug for TreeMaterializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeMaterializer")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}
