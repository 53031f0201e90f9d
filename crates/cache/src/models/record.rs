use crate::error::{Error, ErrorKind};
use crate::transport::Validators;
use exn::ResultExt;
use time::UtcDateTime;

/// Conditional request state for one cached URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: UtcDateTime,
}

impl Record {
    pub(crate) fn new(url: impl Into<String>, validators: Validators) -> Self {
        Self {
            url: url.into(),
            etag: validators.etag,
            last_modified: validators.last_modified,
            fetched_at: UtcDateTime::now(),
        }
    }

    /// The validators to send with the next request for this URL.
    pub fn validators(&self) -> Validators {
        Validators { etag: self.etag.clone(), last_modified: self.last_modified.clone() }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RecordRow {
    pub(crate) url: String,
    pub(crate) etag: Option<String>,
    pub(crate) last_modified: Option<String>,
    pub(crate) fetched_at: i64,
}
impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        Self {
            url: record.url.clone(),
            etag: record.etag.clone(),
            last_modified: record.last_modified.clone(),
            fetched_at: record.fetched_at.unix_timestamp(),
        }
    }
}
impl TryFrom<RecordRow> for Record {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            url: row.url,
            etag: row.etag,
            last_modified: row.last_modified,
            fetched_at: UtcDateTime::from_unix_timestamp(row.fetched_at)
                .or_raise(|| ErrorKind::InvalidData("fetch date"))?,
        })
    }
}
