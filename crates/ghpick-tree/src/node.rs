use std::cmp::Ordering;

use ghpick_types::{ContentEntry, FetchError};

/// A cached entry linked into the tree by path keys.
///
/// The [`RepositoryState`](crate::RepositoryState) map owns every node;
/// `parent` and `children` only name other keys of that map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub entry: ContentEntry,
    /// Path of the parent node, `None` for root entries and orphans.
    pub parent: Option<String>,
    /// Child paths, once a per-directory fetch has cached them.
    pub children: Option<Vec<String>>,
}

impl TreeNode {
    pub fn new(entry: ContentEntry, parent: Option<String>) -> Self {
        Self {
            entry,
            parent,
            children: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.entry.path
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn is_dir(&self) -> bool {
        self.entry.is_dir()
    }

    /// Directories first, then by name.
    pub fn display_order(a: &TreeNode, b: &TreeNode) -> Ordering {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name().cmp(b.name()))
    }
}

/// One row handed to a presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeItem {
    Node(TreeNode),
    /// Placeholder while the root listing is in flight.
    Loading,
    /// Synthetic row standing in for a failed fetch.
    Error(FetchError),
}

impl TreeItem {
    pub fn as_node(&self) -> Option<&TreeNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.as_node().map(TreeNode::path)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<TreeNode> for TreeItem {
    fn from(node: TreeNode) -> Self {
        Self::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_order_puts_directories_first() {
        let mut nodes = vec![
            TreeNode::new(ContentEntry::file("b.txt", 1), None),
            TreeNode::new(ContentEntry::dir("z"), None),
            TreeNode::new(ContentEntry::file("a.txt", 1), None),
            TreeNode::new(ContentEntry::dir("c"), None),
        ];
        nodes.sort_by(TreeNode::display_order);
        let names: Vec<&str> = nodes.iter().map(TreeNode::name).collect();
        assert_eq!(names, vec!["c", "z", "a.txt", "b.txt"]);
    }

    #[test]
    fn item_accessors() {
        let item = TreeItem::from(TreeNode::new(ContentEntry::dir("src"), None));
        assert_eq!(item.path(), Some("src"));
        assert!(!item.is_loading());
        assert!(TreeItem::Loading.path().is_none());
        assert!(TreeItem::Error(FetchError::new("x")).is_error());
    }
}
