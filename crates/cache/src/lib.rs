//! Local download cache for MongoDB artifacts.
//!
//! A cache directory holds every file downloaded so far, keyed by URL, and a
//! SQLite database (`data.db`) with two kinds of data:
//! - **Records**: the `ETag`/`Last-Modified` validators of each cached file,
//!   used to revalidate it with conditional requests.
//! - **Catalog**: every downloadable component of the MongoDB manifest,
//!   rebuilt from scratch whenever the manifest changes.
//!
//! The database is derived data. Deleting the cache directory is always safe.

mod cache;
mod catalog;
mod db;
pub mod error;
mod manifest;
mod models;
mod retry;
pub mod transport;

pub use crate::cache::{Cache, Fetched, MANIFEST_URL};
pub use crate::catalog::{Catalog, Counts, Filters, Query};
pub use crate::db::Database;
pub use crate::manifest::{Download, Manifest, Release};
pub use crate::models::{Entry, Record};
pub use crate::retry::Retry;
