//! Path arithmetic over `/`-separated repository paths.
//!
//! The root of a repository is the empty path. Root-level entries contain no
//! separator. Depth counts path segments: the root has depth 0, `a` depth 1,
//! `a/b` depth 2.

/// Hierarchy separator used in every repository path.
pub const SEPARATOR: char = '/';

/// Path of the repository root.
pub const ROOT_PATH: &str = "";

/// Returns `true` for the root marker.
pub fn is_root(path: &str) -> bool {
    path == ROOT_PATH
}

/// Number of segments in `path`; 0 for the root.
pub fn depth(path: &str) -> usize {
    if is_root(path) {
        0
    } else {
        path.matches(SEPARATOR).count() + 1
    }
}

/// Path of the parent directory, or `None` for root-level entries and the root.
pub fn parent_of(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|idx| &path[..idx])
}

/// Last segment of `path`.
pub fn file_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Returns `true` if `candidate` lies strictly below `ancestor`.
pub fn is_descendant(ancestor: &str, candidate: &str) -> bool {
    if is_root(ancestor) {
        return !is_root(candidate);
    }
    candidate.len() > ancestor.len() + 1
        && candidate.starts_with(ancestor)
        && candidate[ancestor.len()..].starts_with(SEPARATOR)
}

/// Returns `true` if `candidate` is exactly one level below `parent`.
pub fn is_direct_child(parent: &str, candidate: &str) -> bool {
    is_descendant(parent, candidate) && depth(candidate) == depth(parent) + 1
}

/// Join a directory path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if is_root(parent) {
        name.to_string()
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn depth_counts_segments() {
        assert_eq!(depth(""), 0);
        assert_eq!(depth("a"), 1);
        assert_eq!(depth("a/b"), 2);
        assert_eq!(depth("a/b/c"), 3);
    }

    #[test]
    fn parent_of_root_entries_is_none() {
        assert_eq!(parent_of("file1.txt"), None);
        assert_eq!(parent_of(""), None);
        assert_eq!(parent_of("dir1/file2.ts"), Some("dir1"));
        assert_eq!(parent_of("a/b/c"), Some("a/b"));
    }

    #[test]
    fn direct_children_exclude_grandchildren() {
        assert!(is_direct_child("a", "a/b"));
        assert!(is_direct_child("a", "a/d"));
        assert!(!is_direct_child("a", "a/b/c"));
        assert!(!is_direct_child("a", "a"));
        assert!(!is_direct_child("a", "ab/c"));
    }

    #[test]
    fn root_children_have_no_separator() {
        assert!(is_direct_child("", "a"));
        assert!(!is_direct_child("", "a/b"));
        assert!(!is_direct_child("", ""));
    }

    #[test]
    fn descendant_requires_separator_boundary() {
        assert!(is_descendant("a", "a/b/c"));
        assert!(!is_descendant("a", "ab"));
        assert!(!is_descendant("a", "a/"));
        assert!(is_descendant("", "x/y"));
    }

    #[test]
    fn join_and_file_name() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a/b", "c"), "a/b/c");
        assert_eq!(file_name("a/b/c.rs"), "c.rs");
        assert_eq!(file_name("top"), "top");
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_.-]{1,8}"
    }

    proptest! {
        #[test]
        fn joined_child_is_direct_child(
            parts in proptest::collection::vec(segment(), 0..5),
            name in segment(),
        ) {
            let parent = parts.join("/");
            let child = join(&parent, &name);
            prop_assert!(is_direct_child(&parent, &child));
            prop_assert_eq!(parent_of(&child).unwrap_or(""), parent.as_str());
            prop_assert_eq!(depth(&child), depth(&parent) + 1);
        }

        #[test]
        fn grandchild_is_descendant_but_not_child(
            parts in proptest::collection::vec(segment(), 0..4),
            a in segment(),
            b in segment(),
        ) {
            let parent = parts.join("/");
            let grandchild = join(&join(&parent, &a), &b);
            prop_assert!(is_descendant(&parent, &grandchild));
            prop_assert!(!is_direct_child(&parent, &grandchild));
        }
    }
}
