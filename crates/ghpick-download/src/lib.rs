//! Batch retrieval of selected entries into a local directory.
//!
//! The tree core hands a [`Downloader`] the entries resolved from the current
//! selection. [`LocalDownloader`] is the filesystem implementation: it
//! creates directories, decodes inline content itself and asks a
//! [`BlobSource`] for anything that has to be fetched by URL.

pub mod error;
pub mod local;
pub mod traits;

pub use error::{DownloadError, DownloadResult};
pub use local::{safe_join, LocalDownloader, DEFAULT_MAX_CONCURRENT};
pub use traits::{BlobSource, DownloadOutcome, DownloadSummary, Downloader};
