use crate::consts;
use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use regex::Regex;

/// The identifying fields of an `os-release(5)` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// Lowercase distribution identifier (`ubuntu`, `rhel`, `arch`, ...).
    pub id: String,
    /// Absent on rolling-release distributions.
    pub version_id: Option<String>,
}

impl OsRelease {
    pub fn parse(content: &str) -> Result<Self> {
        let id = field(&consts::ID_REGEX, content).ok_or_raise(|| ErrorKind::MissingField("ID"))?;
        Ok(Self { id: id.to_lowercase(), version_id: field(&consts::VERSION_ID_REGEX, content) })
    }
}

/// The first non-empty value captured by `regex`, without its quotes.
fn field(regex: &Regex, content: &str) -> Option<String> {
    let captures = regex.captures(content)?;
    let value = (1..=3).find_map(|group| captures.get(group))?.as_str();
    (!value.is_empty()).then(|| value.to_string())
}
