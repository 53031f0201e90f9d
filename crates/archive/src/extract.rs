use crate::ArchiveFormat;
use crate::error::{ErrorKind, Result};
use crate::pattern::MemberPattern;
use exn::ResultExt;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

/// Mode applied to zip members that carry no Unix permissions.
const DEFAULT_ZIP_MODE: u32 = 0o655;
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Member selection and output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Include pattern tested against the full member path (before
    /// stripping). `None` selects everything.
    pub pattern: Option<String>,
    /// Number of leading path components removed from each member.
    pub strip_components: usize,
    /// Decide what would be extracted without touching the filesystem.
    pub test: bool,
}

/// Outcome of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Destination of every selected member, in archive order.
    pub selected: Vec<PathBuf>,
    /// Number of file and directory members seen in the archive.
    pub members: usize,
    /// Members skipped because their path would escape the destination.
    pub unsafe_members: usize,
    /// Whether this was a dry run.
    pub test: bool,
}

impl Report {
    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Explain why nothing was selected, or `None` if something was.
    pub fn hint(&self, options: &Options) -> Option<String> {
        if !self.selected.is_empty() {
            return None;
        }
        if self.members == 0 {
            return Some("the archive is empty".to_string());
        }
        let verb = if self.test { "would be" } else { "were" };
        let strip = options.strip_components;
        Some(match options.pattern.as_deref() {
            Some(pattern) if strip > 0 => format!(
                "all members {verb} excluded by the pattern \"{pattern}\" and/or stripping {strip} path components"
            ),
            Some(pattern) => format!("no member matched the pattern \"{pattern}\""),
            None if strip > 0 => format!("all member paths {verb} consumed by stripping {strip} path components"),
            None if self.unsafe_members > 0 => format!("all members {verb} skipped as unsafe"),
            None => "the archive contains no extractable members".to_string(),
        })
    }
}

/// A single archive entry as it is being read.
struct Member<'r> {
    name: String,
    is_dir: bool,
    mode: u32,
    content: &'r mut dyn Read,
}

/// Selection and output shared by every archive format and by dry runs.
struct Extractor<'a> {
    dest: &'a Path,
    options: &'a Options,
    pattern: Option<MemberPattern>,
    report: Report,
}

impl<'a> Extractor<'a> {
    fn new(dest: &'a Path, options: &'a Options) -> Result<Self> {
        let pattern = options.pattern.as_deref().map(MemberPattern::new).transpose()?;
        let report = Report { test: options.test, ..Report::default() };
        Ok(Self { dest, options, pattern, report })
    }

    fn visit(&mut self, member: Member<'_>) -> Result<()> {
        self.report.members += 1;
        let Some(target) = self.select(&member.name) else {
            return Ok(());
        };
        if self.options.test {
            tracing::info!(member = %member.name, target = %target.display(), "would extract");
        } else {
            tracing::debug!(member = %member.name, target = %target.display(), "extracting");
            write(member, &target)?;
        }
        self.report.selected.push(target);
        Ok(())
    }

    fn select(&mut self, name: &str) -> Option<PathBuf> {
        let Some(parts) = components(name) else {
            tracing::warn!(member = %name, "skipping archive member that escapes the destination");
            self.report.unsafe_members += 1;
            return None;
        };
        let strip = self.options.strip_components;
        if parts.len() <= strip {
            tracing::trace!(member = %name, strip, "excluded by path stripping");
            return None;
        }
        if let Some(pattern) = &self.pattern
            && !pattern.matches(&parts)
        {
            tracing::trace!(member = %name, "excluded by pattern");
            return None;
        }
        Some(parts[strip..].iter().fold(self.dest.to_path_buf(), |path, part| path.join(part)))
    }
}

/// Normal components of a member path, or `None` for paths that are absolute
/// or climb out through `..`.
fn components(name: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(s) => {
                let s = s.to_str()?;
                if s.contains('\0') {
                    return None;
                }
                parts.push(s);
            },
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts)
}

fn write(member: Member<'_>, target: &Path) -> Result<()> {
    if member.is_dir {
        return std::fs::create_dir_all(target).or_raise(|| ErrorKind::Io);
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
    }
    // Previously extracted files may be read-only.
    if target.is_file() {
        std::fs::remove_file(target).or_raise(|| ErrorKind::Io)?;
    }
    let mut file = File::create(target).or_raise(|| ErrorKind::Io)?;
    std::io::copy(member.content, &mut file).or_raise(|| ErrorKind::Io)?;
    set_mode(target, member.mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777)).or_raise(|| ErrorKind::Io)
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn read_zip(archive: &Path, extractor: &mut Extractor<'_>) -> Result<()> {
    let invalid = || ErrorKind::InvalidArchive(archive.to_path_buf());
    let file = File::open(archive).or_raise(|| ErrorKind::Io)?;
    let mut reader = zip::ZipArchive::new(BufReader::new(file)).or_raise(invalid)?;
    for index in 0..reader.len() {
        let mut entry = reader.by_index(index).or_raise(invalid)?;
        let mode = entry.unix_mode();
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            tracing::debug!(member = %entry.name(), "skipping symbolic link");
            continue;
        }
        let member = Member {
            name: entry.name().to_string(),
            is_dir: entry.is_dir(),
            mode: mode.unwrap_or(DEFAULT_ZIP_MODE),
            content: &mut entry,
        };
        extractor.visit(member)?;
    }
    Ok(())
}

fn read_tar_gz(archive: &Path, extractor: &mut Extractor<'_>) -> Result<()> {
    let invalid = || ErrorKind::InvalidArchive(archive.to_path_buf());
    let file = File::open(archive).or_raise(|| ErrorKind::Io)?;
    let mut reader = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    for entry in reader.entries().or_raise(invalid)? {
        let mut entry = entry.or_raise(invalid)?;
        let kind = entry.header().entry_type();
        let name = entry.path().or_raise(invalid)?.to_string_lossy().into_owned();
        if !kind.is_file() && !kind.is_dir() {
            tracing::debug!(member = %name, ?kind, "skipping non-regular member");
            continue;
        }
        let mode = entry.header().mode().or_raise(invalid)?;
        let member = Member { name, is_dir: kind.is_dir(), mode, content: &mut entry };
        extractor.visit(member)?;
    }
    Ok(())
}

/// Extract the members of `archive` selected by `options` into `dest`.
///
/// The format is chosen from the file name (`.zip`, `.tgz`, `.tar.gz`).
/// Members are visited in archive order. A member is selected when its path
/// is safe, has more components than are being stripped, and matches the
/// include pattern (tested before stripping). Selected directories are
/// created, selected files are written (replacing existing files) and given
/// the member's permission bits on Unix. With [`Options::test`] set the
/// selection is identical but nothing is written.
#[instrument(skip(options), fields(archive = %archive.display(), dest = %dest.display(), test = options.test))]
pub fn extract(archive: &Path, dest: &Path, options: &Options) -> Result<Report> {
    let format = ArchiveFormat::from_path(archive)?;
    let mut extractor = Extractor::new(dest, options)?;
    match format {
        ArchiveFormat::Zip => read_zip(archive, &mut extractor)?,
        ArchiveFormat::TarGzip => read_tar_gz(archive, &mut extractor)?,
    }
    let report = extractor.report;
    tracing::debug!(%format, members = report.members, selected = report.count(), "extraction finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::TempDir;

    type Fixture<'a> = &'a [(&'a str, Option<&'a str>)];

    fn build_tar_gz(dir: &Path, members: Fixture<'_>) -> PathBuf {
        let path = dir.join("fixture.tgz");
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, flate2::Compression::default()));
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_mode(0o750);
            match data {
                Some(data) => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_size(data.len() as u64);
                    builder.append_data(&mut header, name, data.as_bytes()).unwrap();
                },
                None => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    builder.append_data(&mut header, name, std::io::empty()).unwrap();
                },
            }
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    fn build_zip(dir: &Path, members: Fixture<'_>) -> PathBuf {
        let path = dir.join("fixture.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o750);
        for (name, data) in members {
            match data {
                Some(data) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(data.as_bytes()).unwrap();
                },
                None => writer.add_directory(*name, options).unwrap(),
            }
        }
        writer.finish().unwrap();
        path
    }

    fn build(format: ArchiveFormat, dir: &Path, members: Fixture<'_>) -> PathBuf {
        match format {
            ArchiveFormat::Zip => build_zip(dir, members),
            ArchiveFormat::TarGzip => build_tar_gz(dir, members),
        }
    }

    const NESTED: Fixture<'static> = &[
        ("mongodb-linux-7.0.2/", None),
        ("mongodb-linux-7.0.2/bin/", None),
        ("mongodb-linux-7.0.2/bin/mongod", Some("mongod")),
        ("mongodb-linux-7.0.2/bin/mongos", Some("mongos")),
        ("mongodb-linux-7.0.2/LICENSE.txt", Some("license")),
    ];

    #[rstest]
    fn test_strip_zero_creates_everything(#[values(ArchiveFormat::Zip, ArchiveFormat::TarGzip)] format: ArchiveFormat) {
        let dir = TempDir::new().unwrap();
        let archive = build(format, dir.path(), &[("a/b.txt", Some("hello")), ("a/", None)]);
        let out = dir.path().join("out");
        let report = extract(&archive, &out, &Options::default()).unwrap();
        assert_eq!(report.selected, vec![out.join("a").join("b.txt"), out.join("a")]);
        assert_eq!(std::fs::read(out.join("a/b.txt")).unwrap(), b"hello");
        assert!(out.join("a").is_dir());
    }

    #[rstest]
    fn test_strip_one_drops_top_level(#[values(ArchiveFormat::Zip, ArchiveFormat::TarGzip)] format: ArchiveFormat) {
        let dir = TempDir::new().unwrap();
        let archive = build(format, dir.path(), &[("a/b.txt", Some("hello")), ("a/", None)]);
        let out = dir.path().join("out");
        let options = Options { strip_components: 1, ..Options::default() };
        let report = extract(&archive, &out, &options).unwrap();
        assert_eq!(report.count(), 1);
        assert_eq!(std::fs::read(out.join("b.txt")).unwrap(), b"hello");
        assert!(!out.join("a").exists());
    }

    #[rstest]
    fn test_pattern_selects_matching_members(
        #[values(ArchiveFormat::Zip, ArchiveFormat::TarGzip)] format: ArchiveFormat,
    ) {
        let dir = TempDir::new().unwrap();
        let archive = build(format, dir.path(), &[("nested/dir/file.txt", Some("txt")), ("file.bin", Some("bin"))]);
        let out = dir.path().join("out");
        let options = Options { pattern: Some("**/*.txt".to_string()), ..Options::default() };
        let report = extract(&archive, &out, &options).unwrap();
        assert_eq!(report.selected, vec![out.join("nested").join("dir").join("file.txt")]);
        assert!(!out.join("file.bin").exists());
    }

    #[rstest]
    #[case(None, 0)]
    #[case(None, 2)]
    #[case(Some("**/bin/*"), 1)]
    #[case(Some("*/LICENSE.txt"), 0)]
    #[case(Some("nothing/matches"), 0)]
    fn test_dry_run_selects_the_same_members(
        #[values(ArchiveFormat::Zip, ArchiveFormat::TarGzip)] format: ArchiveFormat,
        #[case] pattern: Option<&str>,
        #[case] strip: usize,
    ) {
        let dir = TempDir::new().unwrap();
        let archive = build(format, dir.path(), NESTED);
        let dry_out = dir.path().join("dry");
        let real_out = dir.path().join("real");
        let mut options = Options { pattern: pattern.map(str::to_string), strip_components: strip, test: true };
        let dry = extract(&archive, &dry_out, &options).unwrap();
        options.test = false;
        let real = extract(&archive, &real_out, &options).unwrap();

        let relative = |report: &Report, base: &Path| -> Vec<PathBuf> {
            report.selected.iter().map(|p| p.strip_prefix(base).unwrap().to_path_buf()).collect()
        };
        assert_eq!(relative(&dry, &dry_out), relative(&real, &real_out));
        assert!(dry.test);
        assert!(!real.test);
        assert!(!dry_out.exists(), "a dry run must not write anything");
    }

    #[test]
    fn test_pattern_is_tested_before_stripping() {
        let dir = TempDir::new().unwrap();
        let archive = build_tar_gz(dir.path(), NESTED);
        let out = dir.path().join("out");
        let options = Options { pattern: Some("**/bin/mongod".to_string()), strip_components: 2, test: false };
        let report = extract(&archive, &out, &options).unwrap();
        assert_eq!(report.selected, vec![out.join("mongod")]);
    }

    #[test]
    fn test_unsafe_members_are_never_written() {
        let dir = TempDir::new().unwrap();
        let members = [("../evil.txt", Some("evil")), ("nested/../../evil.txt", Some("evil")), ("ok.txt", Some("ok"))];
        let archive = build_zip(dir.path(), &members);
        let out = dir.path().join("out");
        let report = extract(&archive, &out, &Options::default()).unwrap();
        assert_eq!(report.selected, vec![out.join("ok.txt")]);
        assert_eq!(report.unsafe_members, 2);
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_existing_files_are_replaced() {
        let dir = TempDir::new().unwrap();
        let archive = build_tar_gz(dir.path(), &[("bin/mongod", Some("new"))]);
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join("bin")).unwrap();
        std::fs::write(out.join("bin/mongod"), b"old contents").unwrap();
        extract(&archive, &out, &Options::default()).unwrap();
        assert_eq!(std::fs::read(out.join("bin/mongod")).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[rstest]
    fn test_permission_bits_are_applied(#[values(ArchiveFormat::Zip, ArchiveFormat::TarGzip)] format: ArchiveFormat) {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let archive = build(format, dir.path(), &[("bin/mongod", Some("mongod"))]);
        let out = dir.path().join("out");
        extract(&archive, &out, &Options::default()).unwrap();
        let mode = std::fs::metadata(out.join("bin/mongod")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mongodb.msi");
        std::fs::write(&path, b"not an archive").unwrap();
        let err = extract(&path, dir.path(), &Options::default()).unwrap_err();
        assert!(matches!(*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"definitely not a zip file").unwrap();
        let err = extract(&path, dir.path(), &Options::default()).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidArchive(path));
    }

    #[test]
    fn test_invalid_pattern_fails_before_reading() {
        let dir = TempDir::new().unwrap();
        let archive = build_tar_gz(dir.path(), NESTED);
        let options = Options { pattern: Some("[oops".to_string()), ..Options::default() };
        let err = extract(&archive, dir.path(), &options).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidPattern(_)));
    }

    #[rstest]
    #[case(Some("*.exe"), 3, false, "all members were excluded by the pattern \"*.exe\" and/or stripping 3 path components")]
    #[case(Some("*.exe"), 3, true, "all members would be excluded by the pattern \"*.exe\" and/or stripping 3 path components")]
    #[case(Some("*.exe"), 0, false, "no member matched the pattern \"*.exe\"")]
    #[case(None, 9, false, "all member paths were consumed by stripping 9 path components")]
    #[case(None, 9, true, "all member paths would be consumed by stripping 9 path components")]
    fn test_hint_when_nothing_selected(
        #[case] pattern: Option<&str>,
        #[case] strip: usize,
        #[case] test: bool,
        #[case] expected: &str,
    ) {
        let dir = TempDir::new().unwrap();
        let archive = build_tar_gz(dir.path(), NESTED);
        let options = Options { pattern: pattern.map(str::to_string), strip_components: strip, test };
        let report = extract(&archive, &dir.path().join("out"), &options).unwrap();
        assert_eq!(report.count(), 0);
        assert_eq!(report.hint(&options).as_deref(), Some(expected));
    }

    #[test]
    fn test_hint_for_empty_archive() {
        let dir = TempDir::new().unwrap();
        let archive = build_tar_gz(dir.path(), &[]);
        let options = Options::default();
        let report = extract(&archive, &dir.path().join("out"), &options).unwrap();
        assert_eq!(report.hint(&options).as_deref(), Some("the archive is empty"));
    }

    #[test]
    fn test_no_hint_when_something_selected() {
        let dir = TempDir::new().unwrap();
        let archive = build_tar_gz(dir.path(), NESTED);
        let options = Options { test: true, ..Options::default() };
        let report = extract(&archive, &dir.path().join("out"), &options).unwrap();
        assert_eq!(report.count(), NESTED.len());
        assert_eq!(report.hint(&options), None);
    }
}
