use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use mongodl_archive::{Options, Report};
use mongodl_cache::{Cache, Query, Retry};
use std::path::PathBuf;
use tracing::instrument;

/// A fully resolved download: every filter the catalog needs, plus where
/// and how to extract.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub query: Query,
    pub out: PathBuf,
    pub options: Options,
    /// Stop after resolving the URL.
    pub no_download: bool,
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Resolved(String),
    Extracted(Report),
}

/// Human readable summary of the filters, for error messages.
fn describe(query: &Query) -> String {
    let fields = [
        ("component", query.component.clone()),
        ("version", query.version.as_ref().map(ToString::to_string)),
        ("target", query.target.clone()),
        ("arch", query.arch.clone()),
        ("edition", query.edition.clone()),
    ];
    fields
        .into_iter()
        .filter_map(|(name, value)| Some(format!("{name} \"{}\"", value?)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Download the newest component matching the request and extract it.
#[instrument(skip_all, fields(out = %request.out.display()))]
pub(crate) async fn download(cache: &Cache, request: &Request, retry: &Retry) -> Result<Outcome> {
    let entries = cache.catalog().query(&request.query).await.or_raise(|| ErrorKind::Cache)?;
    let no_match = || ErrorKind::NoMatch(describe(&request.query));
    let entry = entries.into_iter().next().ok_or_raise(no_match)?;
    let url = entry.url().ok_or_raise(no_match)?.to_string();
    tracing::info!(
        component = %entry.component,
        version = %entry.version,
        target = %entry.target,
        arch = %entry.arch,
        edition = %entry.edition,
        "selected download"
    );
    if request.no_download {
        return Ok(Outcome::Resolved(url));
    }

    let fetched = retry.run(|| cache.fetch(&url)).await.or_raise(|| ErrorKind::Cache)?;
    if !fetched.changed {
        tracing::debug!(path = %fetched.path.display(), "using cached download");
    }
    let report = mongodl_archive::extract(&fetched.path, &request.out, &request.options)
        .or_raise(|| ErrorKind::Archive)?;
    match report.hint(&request.options) {
        Some(hint) => tracing::warn!("nothing extracted: {hint}"),
        None if report.test => tracing::info!(count = report.count(), "members would be extracted"),
        None => tracing::info!(count = report.count(), "members extracted"),
    }
    Ok(Outcome::Extracted(report))
}
