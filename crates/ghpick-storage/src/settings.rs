use ghpick_types::RepositoryId;
use serde::{Deserialize, Serialize};

/// User preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_recent_repositories: usize,
    pub max_concurrent_downloads: usize,
    pub show_welcome_on_startup: bool,
    /// Seconds between automatic refreshes; `None` disables them.
    pub auto_refresh_interval: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_recent_repositories: 5,
            max_concurrent_downloads: 3,
            show_welcome_on_startup: true,
            auto_refresh_interval: None,
        }
    }
}

/// A partial settings change: `Some` fields overwrite, `None` fields keep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub max_recent_repositories: Option<usize>,
    pub max_concurrent_downloads: Option<usize>,
    pub show_welcome_on_startup: Option<bool>,
    pub auto_refresh_interval: Option<Option<u64>>,
}

impl Settings {
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(v) = update.max_recent_repositories {
            self.max_recent_repositories = v;
        }
        if let Some(v) = update.max_concurrent_downloads {
            self.max_concurrent_downloads = v;
        }
        if let Some(v) = update.show_welcome_on_startup {
            self.show_welcome_on_startup = v;
        }
        if let Some(v) = update.auto_refresh_interval {
            self.auto_refresh_interval = v;
        }
    }
}

/// Everything a backend persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredState {
    pub recent_repositories: Vec<RepositoryId>,
    pub last_repository: Option<RepositoryId>,
    pub settings: Settings,
}

impl StoredState {
    /// Move `repo` to the front of the recent list and make it the last
    /// repository. Equal identities (owner, name and branch) are collapsed.
    pub fn push_recent(&mut self, repo: RepositoryId) {
        self.recent_repositories.retain(|r| r != &repo);
        self.recent_repositories.insert(0, repo.clone());
        self.recent_repositories
            .truncate(self.settings.max_recent_repositories);
        self.last_repository = Some(repo);
    }
}
