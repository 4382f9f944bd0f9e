use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use ghpick_types::{path, RepositoryId};
use indexmap::IndexMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::node::{TreeItem, TreeNode};

/// Shared result of one in-flight directory fetch.
///
/// Every concurrent request for the same directory awaits the same cell, so
/// the fetch runs once.
pub type PendingLoad = Arc<OnceCell<Vec<TreeItem>>>;

#[derive(Default)]
struct Header {
    repository: Option<RepositoryId>,
    root_items: Option<Vec<TreeItem>>,
    root_loading: bool,
}

/// Identity of the repository being browsed plus everything derived from it.
///
/// Locks are never held across an `.await`; each method takes and releases
/// what it needs.
pub struct RepositoryState {
    header: RwLock<Header>,
    items: RwLock<IndexMap<String, TreeNode>>,
    pending: Mutex<HashMap<String, PendingLoad>>,
    epoch: AtomicU64,
}

impl RepositoryState {
    /// Empty state with no repository.
    pub fn new() -> Self {
        Self {
            header: RwLock::new(Header::default()),
            items: RwLock::new(IndexMap::new()),
            pending: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Switch to `repo`, resetting derived state.
    ///
    /// Returns `false` without touching anything if `repo` is already current.
    pub fn set_repository(&self, repo: RepositoryId) -> bool {
        {
            let mut header = self.header.write().expect("state lock poisoned");
            if header.repository.as_ref() == Some(&repo) {
                return false;
            }
            debug!(%repo, "switching repository");
            header.repository = Some(repo);
        }
        self.reset_state();
        true
    }

    /// Repository being browsed, if any.
    pub fn repository(&self) -> Option<RepositoryId> {
        self.header
            .read()
            .expect("state lock poisoned")
            .repository
            .clone()
    }

    /// Bumped on every reset; a fetch that started in an older epoch is stale.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Drop every derived piece of state, keeping the identity.
    pub fn reset_state(&self) {
        {
            let mut header = self.header.write().expect("state lock poisoned");
            header.root_items = None;
            header.root_loading = false;
        }
        self.clear_item_map();
        self.clear_loading_promises();
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------
    // Root
    // ------------------------------------------------------------------

    /// Root rows, `None` while not loaded.
    pub fn root_items(&self) -> Option<Vec<TreeItem>> {
        self.header
            .read()
            .expect("state lock poisoned")
            .root_items
            .clone()
    }

    /// Replace the root rows; `None` marks them as not loaded.
    pub fn set_root_items(&self, items: Option<Vec<TreeItem>>) {
        self.header.write().expect("state lock poisoned").root_items = items;
    }

    /// Whether a root bulk load is running.
    pub fn is_root_loading(&self) -> bool {
        self.header.read().expect("state lock poisoned").root_loading
    }

    /// Set the root-loading flag. Returns whether it changed.
    pub fn set_root_loading(&self, loading: bool) -> bool {
        let mut header = self.header.write().expect("state lock poisoned");
        if header.root_loading == loading {
            return false;
        }
        header.root_loading = loading;
        debug!(loading, "root loading flag");
        true
    }

    /// Claim the root load if a repository is set, nothing is loaded and no
    /// load is running.
    pub fn try_begin_root_load(&self) -> bool {
        let mut header = self.header.write().expect("state lock poisoned");
        if header.repository.is_none() || header.root_items.is_some() || header.root_loading {
            return false;
        }
        header.root_loading = true;
        true
    }

    // ------------------------------------------------------------------
    // Node map
    // ------------------------------------------------------------------

    /// Insert or replace a node under its path.
    pub fn map_item(&self, node: TreeNode) {
        self.items
            .write()
            .expect("items lock poisoned")
            .insert(node.path().to_string(), node);
    }

    /// Clone of the node mapped at `path`.
    pub fn item(&self, path: &str) -> Option<TreeNode> {
        self.items
            .read()
            .expect("items lock poisoned")
            .get(path)
            .cloned()
    }

    /// Whether a node is mapped at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.items
            .read()
            .expect("items lock poisoned")
            .contains_key(path)
    }

    /// Read access to the live map in insertion order.
    ///
    /// Hold the guard briefly: every writer waits for it.
    pub fn items(&self) -> RwLockReadGuard<'_, IndexMap<String, TreeNode>> {
        self.items.read().expect("items lock poisoned")
    }

    pub(crate) fn items_mut(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, IndexMap<String, TreeNode>> {
        self.items.write().expect("items lock poisoned")
    }

    /// Apply `f` to the node at `path`. Returns `false` if there is none.
    pub fn update_item(&self, path: &str, f: impl FnOnce(&mut TreeNode)) -> bool {
        match self.items_mut().get_mut(path) {
            Some(node) => {
                f(node);
                true
            }
            None => false,
        }
    }

    /// Number of mapped nodes.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Drop every mapped node.
    pub fn clear_item_map(&self) {
        self.items_mut().clear();
    }

    /// Nodes whose path is a direct child of `parent`, directories first.
    pub fn children_of(&self, parent: &str) -> Vec<TreeNode> {
        let mut children: Vec<TreeNode> = self
            .items()
            .values()
            .filter(|n| path::is_direct_child(parent, n.path()))
            .cloned()
            .collect();
        children.sort_by(TreeNode::display_order);
        children
    }

    /// Paths of `root` and of every known strict descendant of it.
    ///
    /// For the root path this is every known path.
    pub fn subtree_paths(&self, root: &str) -> Vec<String> {
        let items = self.items();
        let mut paths = Vec::new();
        if !path::is_root(root) {
            paths.push(root.to_string());
        }
        paths.extend(
            items
                .keys()
                .filter(|k| path::is_descendant(root, k))
                .cloned(),
        );
        paths
    }

    /// Drop every strict descendant of `root` from the map.
    pub fn remove_subtree(&self, root: &str) -> usize {
        let mut items = self.items_mut();
        let before = items.len();
        items.retain(|k, _| !path::is_descendant(root, k));
        before - items.len()
    }

    // ------------------------------------------------------------------
    // Pending loads
    // ------------------------------------------------------------------

    /// Register `load` as the pending fetch of `path`, replacing any other.
    pub fn set_loading_promise(&self, path: &str, load: PendingLoad) {
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .insert(path.to_string(), load);
    }

    /// Pending fetch of `path`, if one is registered.
    pub fn loading_promise(&self, path: &str) -> Option<PendingLoad> {
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .get(path)
            .cloned()
    }

    /// Forget the pending fetch of `path`. Waiters already holding it still
    /// get its result.
    pub fn delete_loading_promise(&self, path: &str) {
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .remove(path);
    }

    /// Forget every pending fetch.
    pub fn clear_loading_promises(&self) {
        self.pending.lock().expect("pending lock poisoned").clear();
    }

    /// Return the pending load for `path`, registering a fresh one if none.
    ///
    /// The flag is `true` when the handle was created by this call.
    pub fn pending_or_insert(&self, path: &str) -> (PendingLoad, bool) {
        let mut pending = self.pending.lock().expect("pending lock poisoned");
        if let Some(load) = pending.get(path) {
            return (Arc::clone(load), false);
        }
        let load: PendingLoad = Arc::new(OnceCell::new());
        pending.insert(path.to_string(), Arc::clone(&load));
        (load, true)
    }

    /// Remove the registry entry for `path` if it is still `load`.
    pub fn settle_loading_promise(&self, path: &str, load: &PendingLoad) {
        let mut pending = self.pending.lock().expect("pending lock poisoned");
        if pending.get(path).is_some_and(|current| Arc::ptr_eq(current, load)) {
            pending.remove(path);
        }
    }

    /// Number of directories with a registered pending fetch.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending lock poisoned").len()
    }
}

impl Default for RepositoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RepositoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryState")
            .field("repository", &self.repository())
            .field("items", &self.len())
            .field("root_loading", &self.is_root_loading())
            .field("pending", &self.pending_count())
            .finish()
    }
}
