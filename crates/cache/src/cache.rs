use crate::catalog::Catalog;
use crate::db::Database;
use crate::error::{ErrorKind, Result};
use crate::manifest::Manifest;
use crate::models::{Record, RecordRow};
use crate::transport::{Response, TransportHandle};
use exn::{OptionExt, ResultExt};
use futures::TryStreamExt;
use sqlx::SqliteConnection;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Location of the MongoDB download manifest.
pub const MANIFEST_URL: &str = "https://downloads.mongodb.org/full.json";
const DATABASE_FILE: &str = "data.db";
const FILES_DIR: &str = "files";
/// Hex digits of the URL hash used to spread files across directories.
const HASH_PREFIX_LEN: usize = 4;

/// The outcome of [`Cache::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// `false` when the server confirmed the cached copy is current.
    pub changed: bool,
    pub path: PathBuf,
}

/// A downloaded body that has not yet replaced the cached file.
struct Staged {
    temp: TempPath,
    dest: PathBuf,
    record: Record,
}

impl Staged {
    fn persist(self) -> Result<PathBuf> {
        self.temp.persist(&self.dest).or_raise(|| ErrorKind::Io)?;
        Ok(self.dest)
    }
}

enum Outcome {
    Unchanged(PathBuf),
    Changed(Staged),
}

/// A cache directory: downloaded files under `files/` and their index in
/// `data.db`.
///
/// Files and records are only ever changed together, so a record exists
/// exactly when its file does.
pub struct Cache {
    root: PathBuf,
    db: Database,
    transport: TransportHandle,
    manifest_url: String,
}

impl Cache {
    /// Open the cache rooted at `root`, creating it if needed.
    #[instrument(skip(transport))]
    pub async fn open(root: &Path, transport: TransportHandle) -> Result<Self> {
        tokio::fs::create_dir_all(root).await.or_raise(|| ErrorKind::Io)?;
        let db = Database::connect(root.join(DATABASE_FILE)).await?;
        Ok(Self { root: root.to_path_buf(), db, transport, manifest_url: MANIFEST_URL.to_string() })
    }

    /// Use a manifest other than [`MANIFEST_URL`].
    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::from(&self.db)
    }

    /// The cache record of `url`, if it has been downloaded.
    pub async fn record(&self, url: &str) -> Result<Option<Record>> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_http_download.sql"))
            .bind(url)
            .fetch_optional(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Record::try_from).transpose()
    }

    /// Where the file downloaded from `url` is kept:
    /// `<root>/files/<hash>/<basename>`.
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        let parsed = reqwest::Url::parse(url).or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
        let name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
        let hash = blake3::hash(url.as_bytes()).to_hex();
        Ok(self.root.join(FILES_DIR).join(&hash.as_str()[..HASH_PREFIX_LEN]).join(name))
    }

    /// Obtain a local copy of `url`, downloading it only if the server
    /// reports a change since the last fetch.
    ///
    /// Never retries; wrap in [`Retry`](crate::Retry) for that.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        let staged = match self.download(url).await? {
            Outcome::Unchanged(path) => return Ok(Fetched { changed: false, path }),
            Outcome::Changed(staged) => staged,
        };
        let mut tx = self.db.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        Self::upsert_record(&mut tx, &staged.record).await?;
        let path = staged.persist()?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(Fetched { changed: true, path })
    }

    /// Sync the catalog with the remote manifest.
    ///
    /// Returns `false` when the manifest has not changed. A manifest that
    /// fails to parse leaves the previous catalog, record and file in place.
    #[instrument(skip(self), fields(url = %self.manifest_url))]
    pub async fn refresh(&self) -> Result<bool> {
        let staged = match self.download(&self.manifest_url).await? {
            Outcome::Unchanged(_) => {
                tracing::debug!("manifest is current");
                return Ok(false);
            },
            Outcome::Changed(staged) => staged,
        };
        let bytes = tokio::fs::read(&staged.temp).await.or_raise(|| ErrorKind::Io)?;
        let manifest = Manifest::from_slice(&bytes)?;
        let mut tx = self.db.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        let counts = Catalog::rebuild(&mut tx, &manifest).await?;
        Self::upsert_record(&mut tx, &staged.record).await?;
        staged.persist()?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(versions = counts.versions, components = counts.components, "catalog refreshed");
        Ok(true)
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Conditional `GET` of `url`. A changed body is written to a temporary
    /// file next to its destination.
    async fn download(&self, url: &str) -> Result<Outcome> {
        let dest = self.path_for(url)?;
        let conditions = self.record(url).await?.map(|record| record.validators()).unwrap_or_default();
        let (validators, mut body) = match self.transport.get(url, &conditions).await? {
            Response::NotModified => {
                let exists = tokio::fs::metadata(&dest).await.is_ok_and(|meta| meta.is_file());
                if !exists {
                    exn::bail!(ErrorKind::CacheConsistency(dest));
                }
                tracing::debug!(path = %dest.display(), "not modified");
                return Ok(Outcome::Unchanged(dest));
            },
            Response::Body { validators, body } => (validators, body),
        };
        let parent = dest.parent().ok_or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io)?;
        let (file, temp) = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(parent)
            .or_raise(|| ErrorKind::Io)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);
        let mut size = 0;
        while let Some(chunk) = body.try_next().await? {
            file.write_all(&chunk).await.or_raise(|| ErrorKind::Io)?;
            size += chunk.len();
        }
        file.flush().await.or_raise(|| ErrorKind::Io)?;
        tracing::debug!(size, path = %dest.display(), "downloaded");
        Ok(Outcome::Changed(Staged { temp, dest, record: Record::new(url, validators) }))
    }

    async fn upsert_record(conn: &mut SqliteConnection, record: &Record) -> Result<()> {
        let row = RecordRow::from(record);
        sqlx::query(include_str!("../queries/upsert_http_download.sql"))
            .bind(row.url)
            .bind(row.etag)
            .bind(row.last_modified)
            .bind(row.fetched_at)
            .execute(conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Counts, Query};
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    const URL: &str = "https://fastdl.mongodb.org/linux/mongodb-linux-x86_64-ubuntu2204-7.0.2.tgz";

    async fn open(transport: &Arc<MockTransport>) -> (tempfile::TempDir, Cache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path(), transport.clone()).await.unwrap();
        (dir, cache)
    }

    fn manifest(versions: &[&str]) -> Vec<u8> {
        let releases: Vec<_> = versions
            .iter()
            .map(|version| {
                json!({
                    "version": version,
                    "githash": "deadbeef",
                    "date": "2024-01-01",
                    "downloads": [{
                        "target": "ubuntu2204",
                        "arch": "x86_64",
                        "edition": "enterprise",
                        "archive": { "url": format!("https://downloads.mongodb.com/linux/mongodb-{version}.tgz") },
                    }],
                })
            })
            .collect();
        serde_json::to_vec(&json!({ "versions": releases })).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/cache");
        let cache = Cache::open(&root, Arc::new(MockTransport::default())).await.unwrap();
        assert!(root.join("data.db").is_file());
        assert_eq!(cache.root(), root);
        cache.close().await;
    }

    #[tokio::test]
    async fn test_path_layout() {
        let (dir, cache) = open(&Arc::new(MockTransport::default())).await;
        let path = cache.path_for(URL).unwrap();
        let relative = path.strip_prefix(dir.path()).unwrap();
        let parts: Vec<_> = relative.iter().map(|part| part.to_str().unwrap()).collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "files");
        assert_eq!(parts[1], &blake3::hash(URL.as_bytes()).to_hex().as_str()[..4]);
        assert_eq!(parts[2], "mongodb-linux-x86_64-ubuntu2204-7.0.2.tgz");
        cache.close().await;
    }

    #[rstest::rstest]
    #[case("https://example.com/")]
    #[case("not a url")]
    #[tokio::test]
    async fn test_path_requires_file_url(#[case] url: &str) {
        let (_dir, cache) = open(&Arc::new(MockTransport::default())).await;
        let err = cache.path_for(url).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidUrl(url.to_string()));
        cache.close().await;
    }

    #[tokio::test]
    async fn test_fetch_downloads_then_revalidates() {
        let transport = Arc::new(MockTransport::with_resources([(URL, "archive bytes, version one")]));
        let (_dir, cache) = open(&transport).await;

        let first = cache.fetch(URL).await.unwrap();
        assert!(first.changed);
        assert_eq!(std::fs::read(&first.path).unwrap(), b"archive bytes, version one");
        let record = cache.record(URL).await.unwrap().unwrap();
        assert_eq!(record.etag, Some(MockTransport::etag(b"archive bytes, version one")));

        let second = cache.fetch(URL).await.unwrap();
        assert_eq!(second, Fetched { changed: false, path: first.path.clone() });
        assert_eq!(std::fs::read(&second.path).unwrap(), b"archive bytes, version one");
        assert_eq!(cache.record(URL).await.unwrap().unwrap().etag, record.etag);
        assert_eq!(transport.requests(URL).await, 2);

        transport.set(URL, "archive bytes, version two").await;
        let third = cache.fetch(URL).await.unwrap();
        assert!(third.changed);
        assert_eq!(std::fs::read(&third.path).unwrap(), b"archive bytes, version two");
        cache.close().await;
    }

    #[tokio::test]
    async fn test_not_modified_with_missing_file_is_fatal() {
        let transport = Arc::new(MockTransport::with_resources([(URL, "archive bytes")]));
        let (_dir, cache) = open(&transport).await;
        let fetched = cache.fetch(URL).await.unwrap();
        std::fs::remove_file(&fetched.path).unwrap();

        let err = cache.fetch(URL).await.unwrap_err();
        assert_eq!(*err, ErrorKind::CacheConsistency(fetched.path));
        assert!(!err.is_retryable());
        cache.close().await;
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_trace() {
        let (_dir, cache) = open(&Arc::new(MockTransport::default())).await;
        let err = cache.fetch(URL).await.unwrap_err();
        assert_eq!(*err, ErrorKind::HttpStatus { url: URL.to_string(), status: 404 });
        assert!(cache.record(URL).await.unwrap().is_none());
        assert!(!cache.path_for(URL).unwrap().exists());
        cache.close().await;
    }

    #[tokio::test]
    async fn test_refresh() {
        let transport = Arc::new(MockTransport::with_resources([(MANIFEST_URL, manifest(&["7.0.2", "6.0.5"]))]));
        let (_dir, cache) = open(&transport).await;
        let catalog = cache.catalog();

        assert!(cache.refresh().await.unwrap());
        assert_eq!(catalog.counts().await.unwrap(), Counts { versions: 2, downloads: 2, components: 2 });
        let before = catalog.query(&Query::default()).await.unwrap();
        assert!(!cache.refresh().await.unwrap());
        assert_eq!(catalog.counts().await.unwrap(), Counts { versions: 2, downloads: 2, components: 2 });
        assert_eq!(catalog.query(&Query::default()).await.unwrap(), before);

        transport.set(MANIFEST_URL, manifest(&["8.0.0"])).await;
        assert!(cache.refresh().await.unwrap());
        let entries = catalog.query(&Query::default()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, "8.0.0");
        cache.close().await;
    }

    #[tokio::test]
    async fn test_refresh_from_custom_manifest_url() {
        let url = "https://mirror.example.com/mongodb/full.json";
        let transport = Arc::new(MockTransport::with_resources([(url, manifest(&["7.0.2"]))]));
        let (_dir, cache) = open(&transport).await;
        let cache = cache.with_manifest_url(url);
        assert!(cache.refresh().await.unwrap());
        assert_eq!(transport.requests(MANIFEST_URL).await, 0);
        cache.close().await;
    }

    #[tokio::test]
    async fn test_invalid_manifest_keeps_previous_state() {
        let transport = Arc::new(MockTransport::with_resources([(MANIFEST_URL, manifest(&["7.0.2"]))]));
        let (_dir, cache) = open(&transport).await;
        assert!(cache.refresh().await.unwrap());
        let record = cache.record(MANIFEST_URL).await.unwrap();

        transport.set(MANIFEST_URL, "<html>502 Bad Gateway</html>").await;
        let err = cache.refresh().await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidManifest);

        assert_eq!(cache.record(MANIFEST_URL).await.unwrap(), record);
        assert_eq!(cache.catalog().filters().await.unwrap().versions, ["7.0.2"]);
        let path = cache.path_for(MANIFEST_URL).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), manifest(&["7.0.2"]));
        cache.close().await;
    }
}
