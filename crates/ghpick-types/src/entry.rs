use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::path;

/// Kind of a remote listing record.
///
/// Symlinks and submodules are treated as file-like leaves: they are never
/// expanded and never have children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Dir)
    }

    /// File-like kinds, i.e. everything that is not a directory.
    pub fn is_leaf(self) -> bool {
        !self.is_dir()
    }
}

/// Where the bytes of a file entry come from.
///
/// A listing record carries at most one of these; the enum makes the two
/// alternatives mutually exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Fetch the raw bytes from this URL.
    Download(String),
    /// The bytes are embedded in the listing, usually base64 encoded.
    Inline {
        content: String,
        encoding: Option<String>,
    },
}

/// One remote listing record, keyed by its repository path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ContentSource>,
}

impl ContentEntry {
    /// Build an entry, deriving the name from the last path segment.
    pub fn new(path: impl Into<String>, kind: EntryKind, size: u64) -> Result<Self, TypeError> {
        let path = path.into();
        if path.is_empty()
            || path.starts_with(path::SEPARATOR)
            || path.ends_with(path::SEPARATOR)
            || path.contains("//")
        {
            return Err(TypeError::InvalidPath(path));
        }
        Ok(Self::unchecked(&path, kind, size))
    }

    /// Shorthand for a file entry. The path is taken as-is.
    pub fn file(path: &str, size: u64) -> Self {
        Self::unchecked(path, EntryKind::File, size)
    }

    /// Shorthand for a directory entry. The path is taken as-is.
    pub fn dir(path: &str) -> Self {
        Self::unchecked(path, EntryKind::Dir, 0)
    }

    fn unchecked(path: &str, kind: EntryKind, size: u64) -> Self {
        Self {
            path: path.to_string(),
            name: path::file_name(path).to_string(),
            kind,
            size,
            sha: String::new(),
            source: None,
        }
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = sha.into();
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(ContentSource::Download(url.into()));
        self
    }

    pub fn with_inline_content(mut self, content: impl Into<String>, encoding: Option<&str>) -> Self {
        self.source = Some(ContentSource::Inline {
            content: content.into(),
            encoding: encoding.map(str::to_string),
        });
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn parent_path(&self) -> Option<&str> {
        path::parent_of(&self.path)
    }

    pub fn depth(&self) -> usize {
        path::depth(&self.path)
    }

    pub fn download_url(&self) -> Option<&str> {
        match &self.source {
            Some(ContentSource::Download(url)) => Some(url),
            _ => None,
        }
    }

    /// Decode inline content into raw bytes.
    ///
    /// Base64 content may contain line breaks (the GitHub API wraps it at 60
    /// columns); whitespace is stripped before decoding. Content without an
    /// encoding is taken verbatim.
    pub fn decode_inline(&self) -> Result<Vec<u8>, TypeError> {
        let Some(ContentSource::Inline { content, encoding }) = &self.source else {
            return Err(TypeError::NoInlineContent {
                path: self.path.clone(),
            });
        };
        match encoding.as_deref() {
            None | Some("utf-8") | Some("utf8") => Ok(content.as_bytes().to_vec()),
            Some("base64") => {
                let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                base64::engine::general_purpose::STANDARD
                    .decode(cleaned)
                    .map_err(|e| TypeError::InvalidBase64 {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    })
            }
            Some(other) => Err(TypeError::UnsupportedEncoding {
                path: self.path.clone(),
                encoding: other.to_string(),
            }),
        }
    }
}
