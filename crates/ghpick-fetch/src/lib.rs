//! Remote content fetching for ghpick.
//!
//! The tree core never talks to GitHub directly. It consumes a
//! [`ContentFetcher`], which answers two questions about a repository: what
//! are the immediate children of a path, and what is every descendant of a
//! path up to a depth bound.
//!
//! # Backends
//!
//! - [`InMemoryFetcher`] -- flat listings held in memory, for tests, demos
//!   and offline snapshots
//!
//! Any HTTP transport can be plugged in by implementing the trait and
//! decoding its responses with [`wire::parse_listing`] or
//! [`wire::parse_git_tree`].

pub mod memory;
pub mod traits;
pub mod wire;

pub use memory::InMemoryFetcher;
pub use traits::ContentFetcher;
pub use wire::{parse_git_tree, parse_listing, parse_snapshot, GitTree};
