//! Selective extraction of downloaded archives.
//!
//! Archives are read member by member. Each member is checked for path
//! safety, trimmed by a number of leading path components and matched against
//! an optional include pattern before anything is written. A test mode runs
//! the same selection without touching the filesystem, so the [`Report`] of a
//! dry run lists exactly what a real run would produce.

pub mod error;
mod extract;
mod format;
mod pattern;

pub use crate::extract::{Options, Report, extract};

/// A supported archive container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// PKZIP archive (.zip)
    Zip,
    /// Gzip-compressed tarball (.tgz, .tar.gz)
    TarGzip,
}
