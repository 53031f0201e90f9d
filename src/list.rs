use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mongodl_cache::{Catalog, Counts, Entry, Filters, Query};
use std::io::Write;

const WIDTH: usize = 78;
const INDENT: &str = "  ";

/// Print the available filter values, or the entries matching `query` when
/// any filter is set.
pub(crate) async fn print(catalog: &Catalog, query: &Query, out: &mut impl Write) -> Result<()> {
    if query.is_empty() {
        let filters = catalog.filters().await.or_raise(|| ErrorKind::Cache)?;
        let counts = catalog.counts().await.or_raise(|| ErrorKind::Cache)?;
        return write_filters(&filters, &counts, out).or_raise(|| ErrorKind::Io);
    }
    let entries = catalog.query(query).await.or_raise(|| ErrorKind::Cache)?;
    write_entries(&entries, out).or_raise(|| ErrorKind::Io)
}

fn write_filters(filters: &Filters, counts: &Counts, out: &mut impl Write) -> std::io::Result<()> {
    for (heading, values) in [
        ("Architectures", &filters.arches),
        ("Targets", &filters.targets),
        ("Editions", &filters.editions),
        ("Versions", &filters.versions),
        ("Components", &filters.components),
    ] {
        writeln!(out, "{heading}:")?;
        for line in wrap(values) {
            writeln!(out, "{line}")?;
        }
    }
    writeln!(
        out,
        "{} versions, {} downloads, {} downloadable components",
        counts.versions, counts.downloads, counts.components
    )
}

fn write_entries(entries: &[Entry], out: &mut impl Write) -> std::io::Result<()> {
    for entry in entries {
        writeln!(out, "Download: {}", entry.component)?;
        writeln!(out, " Version: {}", entry.version)?;
        writeln!(out, "  Target: {}", entry.target)?;
        writeln!(out, "    Arch: {}", entry.arch)?;
        writeln!(out, " Edition: {}", entry.edition)?;
        writeln!(out, "    Info: {}", entry.data)?;
        writeln!(out)?;
    }
    match entries.len() {
        0 => writeln!(out, "No items matched the listed filters")?,
        1 => writeln!(out, "Only one matching item")?,
        count => writeln!(out, "{count} available downloadable components")?,
    }
    writeln!(out, "(Omit filter arguments for a list of available filters)")
}

/// Comma-separated `values`, indented and wrapped to [`WIDTH`] columns.
fn wrap(values: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::from(INDENT);
    for (i, value) in values.iter().enumerate() {
        let item = if i + 1 < values.len() { format!("{value},") } else { value.clone() };
        if line.len() > INDENT.len() && line.len() + 1 + item.len() > WIDTH {
            lines.push(line);
            line = String::from(INDENT);
        }
        if line.len() > INDENT.len() {
            line.push(' ');
        }
        line.push_str(&item);
    }
    lines.push(line);
    lines
}
