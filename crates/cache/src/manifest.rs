//! Typed model of the MongoDB download manifest (`full.json`).

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mongodl_version::Version;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Placeholder stored for downloads that do not name a target or arch.
const UNSPECIFIED: &str = "null";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub versions: Vec<Release>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub version: String,
    #[serde(default)]
    pub githash: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub downloads: Vec<Download>,
}

/// One `(target, arch, edition)` build of a release.
///
/// Every other field of the download object is kept in `fields`; those that
/// are objects with a `url` are its [components](Download::components).
#[derive(Debug, Clone, Deserialize)]
pub struct Download {
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arch: Option<String>,
    pub edition: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Manifest {
    /// Parse and validate a manifest. Every release must carry a valid
    /// version string.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes).or_raise(|| ErrorKind::InvalidManifest)?;
        for release in &manifest.versions {
            release.parsed_version()?;
        }
        Ok(manifest)
    }
}

impl Release {
    pub fn parsed_version(&self) -> Result<Version> {
        Version::parse(&self.version).or_raise(|| ErrorKind::InvalidManifest)
    }
}

impl Download {
    pub fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(UNSPECIFIED)
    }

    pub fn arch(&self) -> &str {
        self.arch.as_deref().unwrap_or(UNSPECIFIED)
    }

    /// Named downloadable files of this build: object fields with a string
    /// `url`.
    pub fn components(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(_, value)| value.get("url").is_some_and(Value::is_string))
            .map(|(key, value)| (key.as_str(), value))
    }
}
