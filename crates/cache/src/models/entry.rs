use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use serde_json::Value;

/// One downloadable component of a catalog entry: a single
/// `(version, target, arch, edition)` download and one of its named files.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub version: String,
    pub githash: String,
    pub date: String,
    pub target: String,
    pub arch: String,
    pub edition: String,
    /// Component key, such as `archive`, `debug_symbols` or `msi`.
    pub component: String,
    /// The component's manifest object; always has a `url`.
    pub data: Value,
}

impl Entry {
    pub fn url(&self) -> Option<&str> {
        self.data.get("url")?.as_str()
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    version: String,
    githash: String,
    date: String,
    target: String,
    arch: String,
    edition: String,
    component: String,
    data: String,
}
impl TryFrom<EntryRow> for Entry {
    type Error = Error;
    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            data: serde_json::from_str(&row.data).or_raise(|| ErrorKind::InvalidData("component data"))?,
            version: row.version,
            githash: row.githash,
            date: row.date,
            target: row.target,
            arch: row.arch,
            edition: row.edition,
            component: row.component,
        })
    }
}
