//! CLI Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("download cache error")]
    Cache,
    /// The host platform could not be mapped to a download target.
    #[display("unable to detect the host platform; pass --target and --arch")]
    Platform,
    #[display("extraction failed")]
    Archive,
    /// No catalog entry matched the requested filters.
    #[display("no download matches {_0}")]
    NoMatch(#[error(not(source))] String),
    #[display("unable to write output")]
    Io,
}
