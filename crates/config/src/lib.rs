//! Layered configuration.
//!
//! Sources are merged in order, later ones overriding earlier ones:
//! 1. built-in defaults,
//! 2. a TOML file (`<config dir>/mongodl/config.toml` unless given),
//! 3. `MONGODL_*` environment variables.
//!
//! Command line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::BaseDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "mongodl";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "MONGODL_";
const DEFAULT_MANIFEST_URL: &str = "https://downloads.mongodb.org/full.json";
const DEFAULT_EDITION: &str = "enterprise";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding downloaded files and the catalog database.
    pub cache_dir: PathBuf,
    pub manifest_url: String,
    /// Edition used when none is requested.
    pub edition: String,
    /// Extra attempts for failed downloads.
    pub retries: u32,
    /// Per-request timeout in seconds. No timeout when unset.
    pub timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            edition: DEFAULT_EDITION.to_string(),
            retries: 0,
            timeout: None,
        }
    }
}

/// `<user cache dir>/mongodl`, or a relative `.mongodl-cache` when the home
/// directory cannot be determined.
fn default_cache_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.cache_dir().join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(".mongodl-cache"))
}

/// `<user config dir>/mongodl/config.toml`.
pub fn default_config_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_NAME).join(CONFIG_FILE))
}

impl Config {
    /// Load and validate the configuration.
    ///
    /// An explicit `file` must exist; the default file is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_file().filter(|path| path.is_file()),
        };
        Self::from_figment(Self::figment(file.as_deref()))
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "loading configuration file");
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.manifest_url.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("manifest_url must not be empty"));
        }
        if self.edition.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("edition must not be empty"));
        }
        if self.timeout == Some(0) {
            exn::bail!(ErrorKind::Invalid("timeout must be at least one second"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
