use crate::download::Request;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use mongodl_archive::Options;
use mongodl_cache::Query;
use mongodl_config::Config;
use mongodl_version::VersionFilter;
use std::path::PathBuf;

/// Value of `--target` and `--arch` that asks for host detection.
const AUTO: &str = "auto";

/// Download and extract MongoDB server artifacts.
///
/// The list of available downloads is cached locally and refreshed on every
/// run. Downloads are cached too, and only fetched again when the server
/// reports a change.
#[derive(Debug, Parser)]
#[command(name = "mongodl")]
pub(crate) struct Args {
    /// Directory where download caches and metadata are stored
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
    /// Configuration file to load instead of the default one
    #[arg(long, value_name = "FILE", env = "MONGODL_CONFIG")]
    pub config: Option<PathBuf>,
    /// Number of times to retry failed downloads
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// List available components, targets, editions, versions and
    /// architectures. Download arguments act as filters.
    #[arg(long, help_heading = "List")]
    pub list: bool,

    /// The version to download: an exact version, a MAJOR.MINOR series,
    /// "latest" (release candidates included), "latest-stable" or "rapid"
    #[arg(short = 'V', long, required_unless_present = "list", help_heading = "Download")]
    pub version: Option<String>,
    /// The target platform; "auto" detects the host
    #[arg(short = 'T', long, help_heading = "Download")]
    pub target: Option<String>,
    /// The architecture; "auto" detects the host
    #[arg(short = 'A', long, help_heading = "Download")]
    pub arch: Option<String>,
    /// The edition to download [default: enterprise]
    #[arg(short = 'E', long, help_heading = "Download")]
    pub edition: Option<String>,
    /// The component to download, such as "archive" or "crypt_shared"
    #[arg(short = 'C', long, required_unless_present = "list", help_heading = "Download")]
    pub component: Option<String>,
    /// Directory to extract into [default: current directory]
    #[arg(short, long, value_name = "DIR", help_heading = "Download")]
    pub out: Option<PathBuf>,
    /// Only extract members whose full path matches this glob. Use "**" to
    /// match any number of directories.
    #[arg(long, value_name = "PATTERN", help_heading = "Download")]
    pub only: Option<String>,
    /// Strip N leading path components from member paths. Members with no
    /// more than N components are skipped.
    #[arg(short = 'p', long = "strip-path-components", value_name = "N", default_value_t = 0, help_heading = "Download")]
    pub strip_components: usize,
    /// Print what would be extracted without writing anything
    #[arg(long, help_heading = "Download")]
    pub test: bool,
    /// Print the download URL and exit
    #[arg(long, help_heading = "Download")]
    pub no_download: bool,
    /// Exit non-zero when no files were (or would be) extracted
    #[arg(long, help_heading = "Download")]
    pub empty_is_error: bool,
}

fn version_filter(version: &str) -> VersionFilter {
    let Ok(filter) = version.parse();
    filter
}

impl Args {
    /// Apply flags that override configuration values.
    pub fn configure(&self, config: &mut Config) {
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
    }

    /// Filters as given, for `--list`.
    pub fn filters(&self) -> Query {
        Query {
            version: self.version.as_deref().map(version_filter),
            target: self.target.clone(),
            arch: self.arch.clone(),
            edition: self.edition.clone(),
            component: self.component.clone(),
        }
    }

    /// Resolve a download request, detecting the host where asked to.
    pub fn request(&self, config: &Config) -> Result<Request> {
        let target = match self.target.as_deref() {
            None | Some(AUTO) => mongodl_platform::infer_target().or_raise(|| ErrorKind::Platform)?,
            Some(target) => target.to_string(),
        };
        let arch = match self.arch.as_deref() {
            None | Some(AUTO) => mongodl_platform::infer_arch(),
            Some(arch) => arch.to_string(),
        };
        let out = match &self.out {
            Some(out) => out.clone(),
            None => std::env::current_dir().or_raise(|| ErrorKind::Io)?,
        };
        Ok(Request {
            query: Query {
                version: self.version.as_deref().map(version_filter),
                target: Some(target),
                arch: Some(arch),
                edition: Some(self.edition.clone().unwrap_or_else(|| config.edition.clone())),
                component: self.component.clone(),
            },
            out,
            options: Options {
                pattern: self.only.clone(),
                strip_components: self.strip_components,
                test: self.test,
            },
            no_download: self.no_download,
        })
    }
}
