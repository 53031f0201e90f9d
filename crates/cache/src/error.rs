//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// The HTTP client could not be constructed.
    #[display("unable to initialise the HTTP client")]
    Client,
    /// The request could not be completed (connection, TLS, interrupted body).
    #[display("download of {_0} failed")]
    Download(#[error(not(source))] String),
    /// The server answered with a status that is neither success nor 304.
    #[display("download of {url} failed with HTTP status {status}")]
    HttpStatus {
        #[error(not(source))]
        url: String,
        #[error(not(source))]
        status: u16,
    },
    /// The URL has no file name to cache the download under.
    #[display("cannot cache {_0}: not a file URL")]
    InvalidUrl(#[error(not(source))] String),
    /// The server reported "not modified" for a file that is no longer on
    /// disk. Delete the cache directory to recover.
    #[display("cache is inconsistent: {} is recorded but missing", _0.display())]
    CacheConsistency(#[error(not(source))] PathBuf),
    /// The manifest is not valid JSON or does not have the expected shape.
    #[display("invalid download manifest")]
    InvalidManifest,
    /// Serialization/deserialization error.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Download(_) | ErrorKind::Io => true,
            ErrorKind::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Download("https://example.com/a.tgz".to_string()), true)]
    #[case(ErrorKind::Io, true)]
    #[case(ErrorKind::HttpStatus { url: "u".to_string(), status: 503 }, true)]
    #[case(ErrorKind::HttpStatus { url: "u".to_string(), status: 429 }, true)]
    #[case(ErrorKind::HttpStatus { url: "u".to_string(), status: 404 }, false)]
    #[case(ErrorKind::CacheConsistency(PathBuf::from("files/ab12/full.json")), false)]
    #[case(ErrorKind::InvalidManifest, false)]
    fn error_kind_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::HttpStatus { url: "https://example.com/x.zip".to_string(), status: 404 }.to_string(),
            "download of https://example.com/x.zip failed with HTTP status 404"
        );
    }
}
