//! Decoding of GitHub API responses into [`ContentEntry`] records.
//!
//! Two shapes are understood:
//!
//! - the Contents API (`/repos/{owner}/{repo}/contents/{path}`), which returns
//!   an array for a directory and a single object for a file;
//! - the Git Trees API (`/repos/{owner}/{repo}/git/trees/{sha}?recursive=1`),
//!   which returns every path of the tree in one flat list and may flag the
//!   list as truncated.
//!
//! Any shape mismatch is reported as a malformed-response [`FetchError`].

use ghpick_types::{path, ContentEntry, ContentSource, EntryKind, FetchError, FetchResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// One record of a Contents API response.
#[derive(Debug, Deserialize)]
struct GithubContent {
    name: String,
    path: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(rename = "type")]
    kind: EntryKind,
    download_url: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

impl GithubContent {
    fn into_entry(self) -> FetchResult<ContentEntry> {
        validate_path(&self.path)?;
        // File responses carry both; inline content saves a round trip.
        let source = match (self.content, self.download_url) {
            (Some(content), _) => Some(ContentSource::Inline {
                content,
                encoding: self.encoding,
            }),
            (None, Some(url)) => Some(ContentSource::Download(url)),
            (None, None) => None,
        };
        Ok(ContentEntry {
            path: self.path,
            name: self.name,
            kind: self.kind,
            size: self.size,
            sha: self.sha,
            source,
        })
    }
}

/// One record of a Git Trees API response.
#[derive(Debug, Deserialize)]
struct GitTreeItem {
    path: String,
    #[serde(default)]
    mode: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    size: u64,
}

impl GitTreeItem {
    fn into_entry(self) -> FetchResult<ContentEntry> {
        validate_path(&self.path)?;
        let kind = match (self.kind.as_str(), self.mode.as_str()) {
            ("tree", _) => EntryKind::Dir,
            ("commit", _) => EntryKind::Submodule,
            ("blob", "120000") => EntryKind::Symlink,
            ("blob", _) => EntryKind::File,
            (other, _) => {
                return Err(FetchError::malformed(format!(
                    "unknown tree item type {other:?} at {}",
                    self.path
                )))
            }
        };
        Ok(ContentEntry {
            name: path::file_name(&self.path).to_string(),
            path: self.path,
            kind,
            size: self.size,
            sha: self.sha,
            source: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GitTreeResponse {
    #[serde(default)]
    sha: String,
    tree: Vec<GitTreeItem>,
    #[serde(default)]
    truncated: bool,
}

/// A decoded Git Trees API response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitTree {
    pub sha: String,
    pub entries: Vec<ContentEntry>,
    /// The remote stopped listing early; `entries` is incomplete.
    pub truncated: bool,
}

fn validate_path(p: &str) -> FetchResult<()> {
    if p.is_empty() || p.starts_with(path::SEPARATOR) || p.ends_with(path::SEPARATOR) {
        return Err(FetchError::malformed(format!("invalid entry path {p:?}")));
    }
    Ok(())
}

/// Decode a Contents API response body.
pub fn parse_listing(body: &str) -> FetchResult<Vec<ContentEntry>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(e.to_string()))?;
    let records: Vec<GithubContent> = match value {
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| FetchError::malformed(e.to_string()))?
        }
        Value::Object(_) => vec![
            serde_json::from_value(value).map_err(|e| FetchError::malformed(e.to_string()))?
        ],
        other => {
            return Err(FetchError::malformed(format!(
                "expected an array or object, got {}",
                json_kind(&other)
            )))
        }
    };
    records.into_iter().map(GithubContent::into_entry).collect()
}

/// Decode a Git Trees API response body.
///
/// A truncated response is not an error; it is logged and flagged.
pub fn parse_git_tree(body: &str) -> FetchResult<GitTree> {
    let response: GitTreeResponse =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(e.to_string()))?;
    if response.truncated {
        warn!(sha = %response.sha, count = response.tree.len(), "git tree response truncated");
    }
    let entries = response
        .tree
        .into_iter()
        .map(GitTreeItem::into_entry)
        .collect::<FetchResult<Vec<_>>>()?;
    Ok(GitTree {
        sha: response.sha,
        entries,
        truncated: response.truncated,
    })
}

/// Decode a saved snapshot in either API shape.
///
/// An object with a `tree` key is read as a Git Trees response; anything else
/// as a Contents response.
pub fn parse_snapshot(body: &str) -> FetchResult<Vec<ContentEntry>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(e.to_string()))?;
    if value.get("tree").is_some() {
        Ok(parse_git_tree(body)?.entries)
    } else {
        parse_listing(body)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
