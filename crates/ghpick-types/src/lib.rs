//! Foundation types for ghpick.
//!
//! This crate provides the value types shared by every other ghpick crate:
//! the identity of the repository being browsed, the flat listing records the
//! remote returns, the `/`-separated path arithmetic used to rebuild a tree
//! from those records, and the tagged failure type of remote calls.
//!
//! # Key Types
//!
//! - [`RepositoryId`] -- owner, name and optional branch of a repository
//! - [`ContentEntry`] -- one remote listing record keyed by path
//! - [`EntryKind`] -- file, directory, symlink or submodule
//! - [`FetchError`] -- human-readable fetch failure with an optional [`FetchStatus`]
//! - [`RateLimit`] -- last known API quota snapshot

pub mod entry;
pub mod error;
pub mod identity;
pub mod path;
pub mod rate_limit;

pub use entry::{ContentEntry, ContentSource, EntryKind};
pub use error::{FetchError, FetchResult, FetchStatus, TypeError};
pub use identity::RepositoryId;
pub use path::{ROOT_PATH, SEPARATOR};
pub use rate_limit::RateLimit;
