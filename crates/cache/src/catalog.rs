//! Queryable index of every downloadable component in the manifest.
//!
//! The index is derived data: it is rebuilt wholesale from the manifest
//! whenever the manifest changes, and never edited in place.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::manifest::Manifest;
use crate::models::{Entry, EntryRow};
use exn::ResultExt;
use mongodl_version::VersionFilter;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

/// Filters for [`Catalog::query`]. Every field is optional; unset fields
/// match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub version: Option<VersionFilter>,
    pub target: Option<String>,
    pub arch: Option<String>,
    pub edition: Option<String>,
    pub component: Option<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinct values present in the catalog, for presenting choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub arches: Vec<String>,
    pub targets: Vec<String>,
    pub editions: Vec<String>,
    /// Ascending by version order, not lexically.
    pub versions: Vec<String>,
    pub components: Vec<String>,
}

/// Row counts of the catalog tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Counts {
    pub versions: i64,
    pub downloads: i64,
    pub components: i64,
}

/// Read access to the catalog tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}
impl From<&Database> for Catalog {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Catalog {
    // =========================================================================
    // Rebuild
    // =========================================================================

    /// Replace the whole catalog with the contents of `manifest`.
    ///
    /// Runs on the caller's connection so it can share a transaction with
    /// the manifest's cache record.
    #[instrument(skip_all, fields(releases = manifest.versions.len()))]
    pub(crate) async fn rebuild(conn: &mut SqliteConnection, manifest: &Manifest) -> Result<Counts> {
        sqlx::query(include_str!("../queries/clear_catalog.sql"))
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut counts = Counts::default();
        for release in &manifest.versions {
            let version = release.parsed_version()?;
            let version_id = sqlx::query(include_str!("../queries/insert_version.sql"))
                .bind(&release.version)
                .bind(&release.githash)
                .bind(&release.date)
                .bind(i64::from(version.major))
                .bind(i64::from(version.minor))
                .bind(version.is_stable())
                .bind(version.is_rapid())
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?
                .last_insert_rowid();
            counts.versions += 1;
            for download in &release.downloads {
                let data = serde_json::to_string(&download.fields).or_raise(|| ErrorKind::InvalidData("download"))?;
                let download_id = sqlx::query(include_str!("../queries/insert_download.sql"))
                    .bind(version_id)
                    .bind(download.target())
                    .bind(download.arch())
                    .bind(&download.edition)
                    .bind(data)
                    .execute(&mut *conn)
                    .await
                    .or_raise(|| ErrorKind::Database)?
                    .last_insert_rowid();
                counts.downloads += 1;
                for (key, value) in download.components() {
                    sqlx::query(include_str!("../queries/insert_component.sql"))
                        .bind(download_id)
                        .bind(key)
                        .bind(value.to_string())
                        .execute(&mut *conn)
                        .await
                        .or_raise(|| ErrorKind::Database)?;
                    counts.components += 1;
                }
            }
        }
        tracing::debug!(?counts, "catalog rebuilt");
        Ok(counts)
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// All components matching `query`, newest version first.
    ///
    /// Entries of the same version keep manifest order. No match is an
    /// empty vector, not an error.
    #[instrument(skip(self))]
    pub async fn query(&self, query: &Query) -> Result<Vec<Entry>> {
        let (exact, series, stable, rapid) = match &query.version {
            None | Some(VersionFilter::Latest) => (None, None, false, false),
            Some(VersionFilter::LatestStable) => (None, None, true, false),
            Some(VersionFilter::Rapid) => (None, None, false, true),
            Some(VersionFilter::Prefix { major, minor }) => (None, Some((*major, *minor)), false, false),
            Some(VersionFilter::Exact(version)) => (Some(version.as_str()), None, false, false),
        };
        let rows: Vec<EntryRow> = sqlx::query_as(include_str!("../queries/query_entries.sql"))
            .bind(query.component.as_deref())
            .bind(query.target.as_deref())
            .bind(query.arch.as_deref())
            .bind(query.edition.as_deref())
            .bind(exact)
            .bind(series.map(|(major, _)| i64::from(major)))
            .bind(series.map(|(_, minor)| i64::from(minor)))
            .bind(stable)
            .bind(rapid)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Entry::try_from).collect()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    async fn list(&self, sql: &'static str) -> Result<Vec<String>> {
        sqlx::query_scalar(sql).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)
    }

    /// Distinct values of every query dimension.
    pub async fn filters(&self) -> Result<Filters> {
        Ok(Filters {
            arches: self.list(include_str!("../queries/list_arches.sql")).await?,
            targets: self.list(include_str!("../queries/list_targets.sql")).await?,
            editions: self.list(include_str!("../queries/list_editions.sql")).await?,
            versions: self.list(include_str!("../queries/list_versions.sql")).await?,
            components: self.list(include_str!("../queries/list_components.sql")).await?,
        })
    }

    pub async fn counts(&self) -> Result<Counts> {
        sqlx::query_as(include_str!("../queries/count_catalog.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
