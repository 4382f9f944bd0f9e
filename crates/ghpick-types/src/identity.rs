use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a remote repository: owner, name and optional branch.
///
/// Two identities are equal when all three fields are equal. An identity
/// without a branch refers to the repository's default branch, so
/// `owner/name` and `owner/name@main` are different identities even if `main`
/// happens to be the default.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Parse a repository URL of the form `github.com/owner/name[/tree/branch]`.
    ///
    /// The scheme (`http://`, `https://`) and a leading `www.` are optional.
    pub fn parse_url(url: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidRepositoryUrl(url.to_string());

        let trimmed = url.trim();
        let lower = trimmed.to_ascii_lowercase();
        let mut start = 0;
        for prefix in ["https://", "http://"] {
            if lower.starts_with(prefix) {
                start = prefix.len();
                break;
            }
        }
        if lower[start..].starts_with("www.") {
            start += "www.".len();
        }
        let rest = &trimmed[start..];
        let rest = rest
            .strip_prefix("github.com/")
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(invalid());
        }

        let mut id = Self::new(parts[0], parts[1]);
        if parts.len() > 3 && parts[2] == "tree" && !parts[3].is_empty() {
            id.branch = Some(parts[3].to_string());
        }
        Ok(id)
    }

    /// `owner/name` without the branch.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Canonical browser URL for this identity.
    pub fn html_url(&self) -> String {
        match &self.branch {
            Some(branch) => format!("https://github.com/{}/tree/{branch}", self.slug()),
            None => format!("https://github.com/{}", self.slug()),
        }
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{branch}", self.owner, self.name),
            None => write!(f, "{}/{}", self.owner, self.name),
        }
    }
}
