//! Version Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A version error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for version operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The string does not follow `MAJOR.MINOR[.PATCH[-TAGNUM]]`.
    #[display("invalid version: {_0}")]
    InvalidVersion(#[error(not(source))] String),
    /// The pre-release tag is not one of `alpha`, `beta` or `rc`.
    #[display("unknown pre-release tag \"{_1}\" in version {_0}")]
    UnknownTag(#[error(not(source))] String, #[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
