use std::sync::RwLock;

use ghpick_types::RepositoryId;

use crate::error::StorageResult;
use crate::settings::{Settings, SettingsUpdate, StoredState};
use crate::traits::SettingsStore;

/// In-memory [`SettingsStore`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<StoredState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored.
    pub fn snapshot(&self) -> StoredState {
        self.state.read().expect("storage lock poisoned").clone()
    }
}

impl SettingsStore for MemoryStorage {
    fn recent_repositories(&self) -> Vec<RepositoryId> {
        self.state
            .read()
            .expect("storage lock poisoned")
            .recent_repositories
            .clone()
    }

    fn add_recent_repository(&self, repo: RepositoryId) -> StorageResult<()> {
        self.state
            .write()
            .expect("storage lock poisoned")
            .push_recent(repo);
        Ok(())
    }

    fn last_repository(&self) -> Option<RepositoryId> {
        self.state
            .read()
            .expect("storage lock poisoned")
            .last_repository
            .clone()
    }

    fn set_last_repository(&self, repo: RepositoryId) -> StorageResult<()> {
        self.state.write().expect("storage lock poisoned").last_repository = Some(repo);
        Ok(())
    }

    fn settings(&self) -> Settings {
        self.state
            .read()
            .expect("storage lock poisoned")
            .settings
            .clone()
    }

    fn update_settings(&self, update: SettingsUpdate) -> StorageResult<Settings> {
        let mut state = self.state.write().expect("storage lock poisoned");
        state.settings.apply(update);
        Ok(state.settings.clone())
    }

    fn clear(&self) -> StorageResult<()> {
        *self.state.write().expect("storage lock poisoned") = StoredState::default();
        Ok(())
    }
}
