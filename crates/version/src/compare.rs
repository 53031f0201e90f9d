//! Version Comparison

use crate::Version;
use std::cmp::Ordering;

impl Ord for Version {
    /// Compare two versions component by component.
    ///
    /// `(major, minor, patch)` first, then the release stage (a release beats
    /// `rc`, which beats `beta`, which beats `alpha`), then the pre-release
    /// number.
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then(self.stage.cmp(&other.stage))
            .then(self.number.cmp(&other.number))
    }
}
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Compare two version strings, suitable for registering as a database
    /// collation.
    ///
    /// Strings that fail to parse sort before every valid version and compare
    /// lexically among themselves, which keeps the order total.
    pub fn collate(a: &str, b: &str) -> Ordering {
        match (a.parse::<Version>(), b.parse::<Version>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            (Err(_), Ok(_)) => Ordering::Less,
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        }
    }
}
