use crate::error::{ErrorKind, Result};
use crate::os_release::OsRelease;
use exn::OptionExt;
use glob::Pattern;

type Table = &'static [(&'static str, &'static str)];

/// Distributions built from an upstream family that MongoDB publishes for.
const FAMILIES: Table = &[
    ("almalinux", "rhel"),
    ("centos", "rhel"),
    ("elementary", "ubuntu"),
    ("fedora", "rhel"),
    ("linuxmint", "ubuntu"),
    ("mint", "ubuntu"),
    ("ol", "rhel"),
    ("opensuse", "sles"),
    ("opensuse-leap", "sles"),
    ("pop", "ubuntu"),
    ("redhat", "rhel"),
    ("rocky", "rhel"),
];

/// Derivatives whose own version numbers differ from their upstream's.
const DERIVATIVE_VERSIONS: &[(&str, Table)] = &[
    ("elementary", &[("6", "20.04"), ("6.*", "20.04"), ("7", "22.04"), ("7.*", "22.04")]),
    ("fedora", &[("2[89]", "8"), ("3[0-3]", "8"), ("3[4-9]", "9"), ("4[0-9]", "9")]),
    ("linuxmint", &[("20", "20.04"), ("20.*", "20.04"), ("21", "22.04"), ("21.*", "22.04")]),
    ("mint", &[("20", "20.04"), ("20.*", "20.04"), ("21", "22.04"), ("21.*", "22.04")]),
];

/// Ordered version patterns for each family; the first match wins.
const TARGETS: &[(&str, Table)] = &[
    ("amzn", &[("2018.*", "amzn64"), ("2", "amazon2"), ("2023", "amazon2023")]),
    ("debian", &[("9", "debian92"), ("9.*", "debian92"), ("10", "debian10"), ("11", "debian11"), ("12", "debian12")]),
    (
        "rhel",
        &[
            ("6", "rhel60"),
            ("6.*", "rhel60"),
            ("7", "rhel70"),
            ("7.*", "rhel70"),
            ("8", "rhel80"),
            ("8.*", "rhel80"),
            ("9", "rhel90"),
            ("9.*", "rhel90"),
        ],
    ),
    (
        "sles",
        &[("10.*", "suse10"), ("11.*", "suse11"), ("12", "suse12"), ("12.*", "suse12"), ("15", "suse15"), ("15.*", "suse15")],
    ),
    (
        "ubuntu",
        &[
            ("24.*", "ubuntu2404"),
            ("22.*", "ubuntu2204"),
            ("20.*", "ubuntu2004"),
            ("18.*", "ubuntu1804"),
            ("16.*", "ubuntu1604"),
            ("14.*", "ubuntu1404"),
        ],
    ),
];

fn find<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn lookup(table: Table, version: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(pattern, _)| Pattern::new(pattern).is_ok_and(|p| p.matches(version)))
        .map(|(_, value)| *value)
}

/// Resolve a download target from the contents of an `os-release(5)` file.
pub fn infer_target_from_os_release(content: &str) -> Result<String> {
    let release = OsRelease::parse(content)?;
    tracing::debug!(id = %release.id, version = ?release.version_id, "parsed os-release");
    // There are no Arch builds, but the RHEL 8 ones run fine.
    if release.id == "arch" {
        return Ok("rhel80".to_string());
    }
    let version = release.version_id.ok_or_raise(|| ErrorKind::MissingField("VERSION_ID"))?;
    let family = find(FAMILIES, &release.id).unwrap_or(release.id.as_str());
    let version = match find(DERIVATIVE_VERSIONS, &release.id) {
        Some(table) => lookup(table, &version)
            .ok_or_raise(|| ErrorKind::UnmappedVersion { distro: release.id.clone(), version: version.clone() })?
            .to_string(),
        None => version,
    };
    let table = find(TARGETS, family).ok_or_raise(|| ErrorKind::UnknownDistribution(release.id.clone()))?;
    let target = lookup(table, &version)
        .ok_or_raise(|| ErrorKind::UnmappedVersion { distro: family.to_string(), version: version.clone() })?;
    tracing::debug!(%family, %version, %target, "resolved download target");
    Ok(target.to_string())
}
