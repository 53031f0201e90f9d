use crate::{Stage, Version};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Which versions a catalog query should consider.
///
/// Parsed from user input: the sentinels `latest`, `latest-stable` and
/// `rapid`, a bare `MAJOR.MINOR` series, or anything else as an exact
/// version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionFilter {
    /// Every version, including pre-releases.
    Latest,
    /// Full releases only.
    LatestStable,
    /// Full releases outside of the `X.0` line.
    Rapid,
    /// Any version of one `MAJOR.MINOR` series, pre-releases included.
    Prefix { major: u32, minor: u32 },
    /// Exactly this version string.
    Exact(String),
}

impl FromStr for VersionFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "latest" => VersionFilter::Latest,
            "latest-stable" => VersionFilter::LatestStable,
            "rapid" => VersionFilter::Rapid,
            _ => match Version::parse(s) {
                Ok(Version { major, minor, stage: Stage::Series, .. }) => VersionFilter::Prefix { major, minor },
                _ => VersionFilter::Exact(s.to_string()),
            },
        })
    }
}

impl fmt::Display for VersionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionFilter::Latest => f.write_str("latest"),
            VersionFilter::LatestStable => f.write_str("latest-stable"),
            VersionFilter::Rapid => f.write_str("rapid"),
            VersionFilter::Prefix { major, minor } => write!(f, "{major}.{minor}"),
            VersionFilter::Exact(version) => f.write_str(version),
        }
    }
}
