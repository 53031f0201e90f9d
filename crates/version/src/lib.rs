//! MongoDB server version model.
//!
//! Versions look like `MAJOR.MINOR.PATCH[-TAGNUM]` where the optional tag is
//! one of `alpha`, `beta` or `rc`. A bare `MAJOR.MINOR` is accepted as a
//! reference to a whole release series.

mod compare;
mod consts;
pub mod error;
mod filter;
mod version;

pub use crate::filter::VersionFilter;
pub use crate::version::{Stage, Version};
