use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use ghpick_types::path;
use tracing::debug;

use crate::notify::ChangeNotifier;
use crate::state::RepositoryState;

/// Set of selected paths.
///
/// Membership is independent of load state: a selected path stays selected
/// when its node is evicted by a refresh. Recursive toggles only look at
/// nodes already present in the [`RepositoryState`]; they never fetch.
pub struct SelectionEngine {
    state: Arc<RepositoryState>,
    selected: RwLock<BTreeSet<String>>,
    notifier: ChangeNotifier,
}

impl SelectionEngine {
    pub fn new(state: Arc<RepositoryState>, notifier: ChangeNotifier) -> Self {
        Self {
            state,
            selected: RwLock::new(BTreeSet::new()),
            notifier,
        }
    }

    /// Flip membership of `path` and return the new membership.
    pub fn toggle(&self, path: &str) -> bool {
        let now_selected = {
            let mut selected = self.selected.write().expect("selection lock poisoned");
            if selected.remove(path) {
                false
            } else {
                selected.insert(path.to_string());
                true
            }
        };
        debug!(path, selected = now_selected, "toggled");
        self.notifier.selection_changed();
        now_selected
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected
            .read()
            .expect("selection lock poisoned")
            .contains(path)
    }

    /// Selected paths in lexical order.
    pub fn list(&self) -> Vec<String> {
        self.selected
            .read()
            .expect("selection lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.read().expect("selection lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty the selection. Notifies only if something was selected.
    pub fn clear(&self) -> bool {
        let was_empty = {
            let mut selected = self.selected.write().expect("selection lock poisoned");
            let was_empty = selected.is_empty();
            selected.clear();
            was_empty
        };
        if !was_empty {
            self.notifier.selection_changed();
        }
        !was_empty
    }

    /// Add every path in `paths`. Notifies once if anything was added.
    pub fn select_many<I, S>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added = {
            let mut selected = self.selected.write().expect("selection lock poisoned");
            let mut added = 0;
            for p in paths {
                if selected.insert(p.into()) {
                    added += 1;
                }
            }
            added
        };
        if added > 0 {
            self.notifier.selection_changed();
        }
        added
    }

    /// Apply one target state to `root` and every known descendant of it.
    ///
    /// For a directory the target is the opposite of its own membership. For
    /// the repository root (empty path) everything known is deselected when
    /// all of it is already selected, and selected otherwise. Returns the
    /// number of paths whose membership changed; one notification is sent iff
    /// that number is non-zero.
    pub fn toggle_recursive(&self, root: &str) -> usize {
        let affected = self.state.subtree_paths(root);
        let changed = {
            let mut selected = self.selected.write().expect("selection lock poisoned");
            let target = if path::is_root(root) {
                !affected.iter().all(|p| selected.contains(p))
            } else {
                !selected.contains(root)
            };
            affected
                .into_iter()
                .filter(|p| {
                    if target {
                        selected.insert(p.clone())
                    } else {
                        selected.remove(p)
                    }
                })
                .count()
        };
        debug!(path = root, changed, "recursive toggle");
        if changed > 0 {
            self.notifier.selection_changed();
        }
        changed
    }
}

impl std::fmt::Debug for SelectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionEngine")
            .field("selected", &self.len())
            .finish()
    }
}
