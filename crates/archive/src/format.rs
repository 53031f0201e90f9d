use crate::ArchiveFormat;
use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

impl Display for ArchiveFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl ArchiveFormat {
    /// Detect the archive format from a file name.
    ///
    /// `.tar.gz` is a double extension, so the whole file name is inspected
    /// rather than [`Path::extension`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_lowercase();
        if name.ends_with(".zip") {
            return Ok(ArchiveFormat::Zip);
        }
        if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            return Ok(ArchiveFormat::TarGzip);
        }
        exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGzip => "tar.gz",
        }
    }
}
