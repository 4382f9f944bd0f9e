use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository url: {0}")]
    InvalidRepositoryUrl(String),

    #[error("invalid entry path: {0:?}")]
    InvalidPath(String),

    #[error("entry {path} has no inline content")]
    NoInlineContent { path: String },

    #[error("unsupported content encoding {encoding:?} for {path}")]
    UnsupportedEncoding { path: String, encoding: String },

    #[error("invalid base64 content for {path}: {reason}")]
    InvalidBase64 { path: String, reason: String },
}

/// Classification of a failed remote call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchStatus {
    /// The path or repository does not exist (HTTP 404).
    NotFound,
    /// Credentials were missing or rejected (HTTP 401, or 403 without quota exhaustion).
    Unauthorized,
    /// The API quota is exhausted; `reset` is the epoch second it refills.
    RateLimited { reset: Option<u64> },
    /// Network failure or timeout; a retry may succeed.
    Transient,
    /// The response did not have the expected shape.
    Malformed,
    /// Any other non-success HTTP status.
    Http(u16),
}

impl FetchStatus {
    /// Classify an HTTP status code.
    pub fn from_http(code: u16) -> Self {
        match code {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized,
            429 => Self::RateLimited { reset: None },
            408 | 502 | 503 | 504 => Self::Transient,
            other => Self::Http(other),
        }
    }

    /// Whether repeating the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited { .. })
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not-found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RateLimited { .. } => write!(f, "rate-limited"),
            Self::Transient => write!(f, "transient"),
            Self::Malformed => write!(f, "malformed"),
            Self::Http(code) => write!(f, "http-{code}"),
        }
    }
}

/// A failed remote fetch: a human-readable message plus an optional status.
///
/// Fetchers never panic or throw across the tree core; every failure is
/// reported as one of these and surfaced to the presentation layer as a
/// synthetic error node.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub status: Option<FetchStatus>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: FetchStatus) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::with_status(format!("path not found: {path:?}"), FetchStatus::NotFound)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::with_status(
            format!("malformed response: {}", reason.into()),
            FetchStatus::Malformed,
        )
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Self::with_status(reason, FetchStatus::Transient)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(FetchStatus::NotFound)
    }
}

/// Result alias for remote content operations.
pub type FetchResult<T> = Result<T, FetchError>;
