use ghpick_types::RepositoryId;

use crate::error::StorageResult;
use crate::settings::{Settings, SettingsUpdate};

/// Storage backend for persisted user state.
///
/// Reads never fail; a backend that cannot read its medium starts from
/// defaults. Writes report failures to persist.
pub trait SettingsStore: Send + Sync {
    /// Most recent first.
    fn recent_repositories(&self) -> Vec<RepositoryId>;

    /// Record a visit: moves `repo` to the front of the recents and makes it
    /// the last repository.
    fn add_recent_repository(&self, repo: RepositoryId) -> StorageResult<()>;

    fn last_repository(&self) -> Option<RepositoryId>;

    fn set_last_repository(&self, repo: RepositoryId) -> StorageResult<()>;

    fn settings(&self) -> Settings;

    fn update_settings(&self, update: SettingsUpdate) -> StorageResult<Settings>;

    /// Forget recents, the last repository and every settings change.
    fn clear(&self) -> StorageResult<()>;
}
