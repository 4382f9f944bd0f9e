use serde::Serialize;

use crate::node::{TreeItem, TreeNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Folder,
    FolderActive,
    File,
    Check,
    Loading,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collapsible {
    None,
    Collapsed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Checked,
    Unchecked,
}

impl From<bool> for CheckState {
    fn from(selected: bool) -> Self {
        if selected {
            Self::Checked
        } else {
            Self::Unchecked
        }
    }
}

/// Presentation attributes of one row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Decoration {
    pub label: String,
    pub tooltip: Option<String>,
    /// Human-readable size, files only.
    pub description: Option<String>,
    pub icon: Icon,
    pub collapsible: Collapsible,
    pub checkbox: Option<CheckState>,
}

/// Anything a presentation layer can render.
pub trait Decorate {
    fn decorate(&self, selected: bool) -> Decoration;
}

impl Decorate for TreeNode {
    fn decorate(&self, selected: bool) -> Decoration {
        let dir = self.is_dir();
        let icon = match (dir, selected) {
            (true, true) => Icon::FolderActive,
            (true, false) => Icon::Folder,
            (false, true) => Icon::Check,
            (false, false) => Icon::File,
        };
        let description = (!dir && self.entry.size > 0).then(|| format_size(self.entry.size));
        Decoration {
            label: self.name().to_string(),
            tooltip: Some(self.path().to_string()),
            description,
            icon,
            collapsible: if dir {
                Collapsible::Collapsed
            } else {
                Collapsible::None
            },
            checkbox: Some(selected.into()),
        }
    }
}

impl Decorate for TreeItem {
    fn decorate(&self, selected: bool) -> Decoration {
        match self {
            Self::Node(node) => node.decorate(selected),
            Self::Loading => Decoration {
                label: "Loading...".to_string(),
                tooltip: None,
                description: None,
                icon: Icon::Loading,
                collapsible: Collapsible::None,
                checkbox: None,
            },
            Self::Error(e) => Decoration {
                label: format!("Error: {e}"),
                tooltip: e.status.as_ref().map(ToString::to_string),
                description: None,
                icon: Icon::Error,
                collapsible: Collapsible::None,
                checkbox: None,
            },
        }
    }
}

/// Size in B, KB, MB or GB with one decimal above bytes.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.1} GB", b / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghpick_types::{ContentEntry, FetchError, FetchStatus};

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn file_decoration() {
        let node = TreeNode::new(ContentEntry::file("docs/a.md", 2048), Some("docs".into()));
        let d = node.decorate(false);
        assert_eq!(d.label, "a.md");
        assert_eq!(d.tooltip.as_deref(), Some("docs/a.md"));
        assert_eq!(d.description.as_deref(), Some("2.0 KB"));
        assert_eq!(d.icon, Icon::File);
        assert_eq!(d.collapsible, Collapsible::None);
        assert_eq!(node.decorate(true).icon, Icon::Check);
        assert_eq!(node.decorate(true).checkbox, Some(CheckState::Checked));
    }

    #[test]
    fn directory_decoration() {
        let node = TreeNode::new(ContentEntry::dir("docs"), None);
        let d = node.decorate(true);
        assert_eq!(d.icon, Icon::FolderActive);
        assert_eq!(d.collapsible, Collapsible::Collapsed);
        assert!(d.description.is_none());
        assert_eq!(node.decorate(false).icon, Icon::Folder);
    }

    #[test]
    fn synthetic_rows() {
        assert_eq!(TreeItem::Loading.decorate(true).icon, Icon::Loading);
        let err = TreeItem::Error(FetchError::with_status("denied", FetchStatus::Unauthorized));
        let d = err.decorate(false);
        assert_eq!(d.icon, Icon::Error);
        assert!(d.label.contains("denied"));
        assert!(d.checkbox.is_none());
        assert!(d.tooltip.is_some());
    }
}
