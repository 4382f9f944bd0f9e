use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use ghpick_types::RepositoryId;
use tracing::{debug, warn};

use crate::error::StorageResult;
use crate::settings::{Settings, SettingsUpdate, StoredState};
use crate::traits::SettingsStore;

/// [`SettingsStore`] persisted as one pretty-printed JSON file.
///
/// The file is read once on open and rewritten after every change. A missing
/// file starts from defaults; an unreadable one is logged and replaced on the
/// next write.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    state: RwLock<StoredState>,
}

impl JsonStorage {
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable state file, starting fresh");
                    StoredState::default()
                }
            }
        } else {
            StoredState::default()
        };
        debug!(path = %path.display(), "opened state file");
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, state: &StoredState) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoredState) -> T) -> StorageResult<T> {
        let mut state = self.state.write().expect("storage lock poisoned");
        let out = f(&mut state);
        self.save(&state)?;
        Ok(out)
    }
}

impl SettingsStore for JsonStorage {
    fn recent_repositories(&self) -> Vec<RepositoryId> {
        self.state
            .read()
            .expect("storage lock poisoned")
            .recent_repositories
            .clone()
    }

    fn add_recent_repository(&self, repo: RepositoryId) -> StorageResult<()> {
        self.mutate(|s| s.push_recent(repo))
    }

    fn last_repository(&self) -> Option<RepositoryId> {
        self.state
            .read()
            .expect("storage lock poisoned")
            .last_repository
            .clone()
    }

    fn set_last_repository(&self, repo: RepositoryId) -> StorageResult<()> {
        self.mutate(|s| s.last_repository = Some(repo))
    }

    fn settings(&self) -> Settings {
        self.state
            .read()
            .expect("storage lock poisoned")
            .settings
            .clone()
    }

    fn update_settings(&self, update: SettingsUpdate) -> StorageResult<Settings> {
        self.mutate(|s| {
            s.settings.apply(update);
            s.settings.clone()
        })
    }

    fn clear(&self) -> StorageResult<()> {
        self.mutate(|s| *s = StoredState::default())
    }
}
