//! Platform Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A platform detection error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for platform detection.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant means the host could not be identified automatically; pass
/// an explicit target instead.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The os-release file could not be read.
    #[display("unable to read {}", _0.display())]
    OsRelease(#[error(not(source))] PathBuf),
    /// A required os-release field is absent.
    #[display("os-release has no {_0} field")]
    MissingField(#[error(not(source))] &'static str),
    /// The distribution is not one MongoDB publishes builds for.
    #[display("unknown distribution: {_0}")]
    UnknownDistribution(#[error(not(source))] String),
    /// The distribution is known, but this release of it is not.
    #[display("no download target for {distro} {version}")]
    UnmappedVersion {
        #[error(not(source))]
        distro: String,
        #[error(not(source))]
        version: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
