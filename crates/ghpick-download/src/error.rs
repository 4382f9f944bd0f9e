use thiserror::Error;

/// Errors from writing a single entry.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The entry path would resolve outside the destination directory.
    #[error("unsafe entry path: {0}")]
    UnsafePath(String),

    /// The entry carries neither inline content nor a usable download URL.
    #[error("no content available for {0}")]
    NoContent(String),

    /// Inline content could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] ghpick_types::TypeError),

    /// The blob source failed to produce the bytes.
    #[error("blob fetch failed for {path}: {reason}")]
    Blob { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
