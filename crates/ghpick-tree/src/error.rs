use thiserror::Error;

/// Errors surfaced by the tree core.
///
/// Remote failures are not in here: they become [`TreeItem::Error`](crate::TreeItem)
/// nodes instead of propagating.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("no repository is set")]
    NoRepository,

    #[error("nothing is selected")]
    EmptySelection,

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
