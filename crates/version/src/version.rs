use crate::consts;
use crate::error::{Error, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::fmt;
use std::str::FromStr;

/// Release stage of a version, in ascending order of maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// A bare `MAJOR.MINOR` series reference with no patch component. Ranks
    /// below every pre-release of the same series.
    Series,
    Alpha,
    Beta,
    ReleaseCandidate,
    Release,
}

impl Stage {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "alpha" => Some(Stage::Alpha),
            "beta" => Some(Stage::Beta),
            "rc" => Some(Stage::ReleaseCandidate),
            _ => None,
        }
    }

    /// The pre-release tag as it appears in a version string.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Stage::Alpha => Some("alpha"),
            Stage::Beta => Some("beta"),
            Stage::ReleaseCandidate => Some("rc"),
            Stage::Series | Stage::Release => None,
        }
    }
}

/// A MongoDB server version, such as `7.0.2` or `8.0.0-rc12`.
///
/// Ordering is lexicographic over `(major, minor, patch, stage, number)`, so
/// a release sorts after every pre-release of the same `major.minor.patch`.
/// See [`Version::collate`] for comparing raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub stage: Stage,
    /// Pre-release number (the `12` in `rc12`); zero for releases.
    pub number: u32,
}

impl Version {
    /// Construct a release version.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch, stage: Stage::Release, number: 0 }
    }

    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// A stable version is a full release: it has a patch component and no
    /// pre-release tag.
    pub fn is_stable(&self) -> bool {
        self.stage == Stage::Release
    }

    /// Rapid releases are stable versions outside of the `X.0` long-term
    /// support line (`7.1.0`, `7.3.4`, but not `7.0.2`).
    pub fn is_rapid(&self) -> bool {
        self.is_stable() && self.minor != 0
    }
}

fn number(value: &str, version: &str) -> Result<u32> {
    value.parse::<u32>().or_raise(|| ErrorKind::InvalidVersion(version.to_string()))
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let captures = consts::VERSION_REGEX.captures(s).ok_or_raise(|| ErrorKind::InvalidVersion(s.to_string()))?;
        let major = number(&captures[1], s)?;
        let minor = number(&captures[2], s)?;
        let Some(patch) = captures.get(3) else {
            return Ok(Self { major, minor, patch: 0, stage: Stage::Series, number: 0 });
        };
        let patch = number(patch.as_str(), s)?;
        let (Some(tag), Some(pre)) = (captures.get(4), captures.get(5)) else {
            return Ok(Self::new(major, minor, patch));
        };
        let tag = tag.as_str();
        let stage = Stage::from_tag(tag).ok_or_raise(|| ErrorKind::UnknownTag(s.to_string(), tag.to_string()))?;
        Ok(Self { major, minor, patch, stage, number: number(pre.as_str(), s)? })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stage == Stage::Series {
            return write!(f, "{}.{}", self.major, self.minor);
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        match self.stage.tag() {
            Some(tag) => write!(f, "-{tag}{}", self.number),
            None => Ok(()),
        }
    }
}
