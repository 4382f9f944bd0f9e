//! Repository tree cache and selection engine for ghpick.
//!
//! A remote repository is listed as flat, path-keyed records. This crate
//! rebuilds the hierarchy from those records on demand, caches what it has
//! seen, makes sure each directory is fetched at most once at a time, and
//! keeps a selection set whose recursive toggle covers whole subtrees.
//!
//! # Key Types
//!
//! - [`Explorer`] -- the context object wiring every component together
//! - [`RepositoryState`] -- repository identity, node arena and pending loads
//! - [`TreeMaterializer`] -- root bulk load, per-directory loads and merging
//! - [`SelectionEngine`] -- selected paths and recursive toggling
//! - [`ChangeNotifier`] -- broadcast of [`ChangeEvent`]s to any subscriber
//! - [`TreeItem`] / [`TreeNode`] -- what a presentation layer renders
//! - [`Decorate`] -- turns an item into a [`Decoration`]

pub mod config;
pub mod decoration;
pub mod error;
pub mod explorer;
pub mod materializer;
pub mod node;
pub mod notify;
pub mod selection;
pub mod state;

pub use config::ExplorerConfig;
pub use decoration::{format_size, CheckState, Collapsible, Decorate, Decoration, Icon};
pub use error::{TreeError, TreeResult};
pub use explorer::Explorer;
pub use materializer::TreeMaterializer;
pub use node::{TreeItem, TreeNode};
pub use notify::{ChangeEvent, ChangeNotifier, ChangeStream};
pub use selection::SelectionEngine;
pub use state::{PendingLoad, RepositoryState};
