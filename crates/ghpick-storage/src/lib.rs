//! Persisted user state for ghpick.
//!
//! Three things survive between sessions: the [`Settings`], the list of
//! recently browsed repositories (most recent first, bounded by
//! `max_recent_repositories`) and the last repository browsed.
//!
//! # Backends
//!
//! - [`MemoryStorage`] -- process-local, for tests
//! - [`JsonStorage`] -- a single JSON file, rewritten on every change

pub mod error;
pub mod json;
pub mod memory;
pub mod settings;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;
pub use settings::{Settings, SettingsUpdate, StoredState};
pub use traits::SettingsStore;
