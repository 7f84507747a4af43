//! Unified error types for savor.
//!
//! Every variant belongs to one of two classes: fatal errors abort the whole
//! batch (configuration, cache I/O, database), per-item errors only shrink the
//! resulting dataset (network, extraction, geocoding).

use std::path::PathBuf;

use tokio_rusqlite::rusqlite;

/// Unified error types for the savor pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL list entry).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Malformed adapter configuration or other setup problem.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    /// No registered adapter accepts the URL's host.
    #[error("NO_ADAPTER: no adapter for URL {0}")]
    NoAdapter(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Cache file or directory could not be read or written.
    #[error("CACHE_IO: {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file exists but could not be decoded.
    #[error("CACHE_CORRUPT: {0}")]
    CacheCorrupt(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A required field was missing, empty, or failed to parse.
    #[error("EXTRACT_FAILED: {field}: {reason}")]
    ExtractFailed { field: String, reason: String },

    /// Geocoding provider failed for an address.
    #[error("GEOCODE_FAILED: {0}")]
    GeocodeFailed(String),

    /// Geocoding provider returned no match for an address.
    #[error("ZERO_RESULTS: {0}")]
    ZeroResults(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// A background task panicked or was cancelled.
    #[error("INTERNAL: {0}")]
    Internal(String),

    /// The run was stopped by a shutdown signal.
    #[error("INTERRUPTED: crawl cancelled")]
    Interrupted,
}

impl Error {
    /// Shorthand for an extraction failure tagged with the failing field.
    pub fn extract(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ExtractFailed { field: field.into(), reason: reason.into() }
    }

    /// Shorthand for a cache I/O failure on `path`.
    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::CacheIo { path: path.into(), source }
    }

    /// Whether this error must stop the batch.
    ///
    /// Network, extraction, and geocoding failures are scoped to a single item
    /// and only shrink the result set.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::InvalidInput(_)
            | Error::Config(_)
            | Error::NoAdapter(_)
            | Error::CacheIo { .. }
            | Error::CacheCorrupt(_)
            | Error::Database(_)
            | Error::Internal(_)
            | Error::Interrupted => true,
            Error::InvalidUrl(_)
            | Error::FetchTimeout(_)
            | Error::HttpError(_)
            | Error::ExtractFailed { .. }
            | Error::GeocodeFailed(_)
            | Error::ZeroResults(_) => false,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
