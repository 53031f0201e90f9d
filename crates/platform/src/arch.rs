/// The architecture of the running host, using MongoDB's naming.
pub fn infer_arch() -> String {
    // Apple Silicon builds are published as "arm64", Linux ones as "aarch64".
    let machine = match std::env::consts::ARCH {
        "aarch64" if cfg!(target_os = "macos") => "arm64",
        arch => arch,
    };
    infer_arch_from(machine)
}

/// Map a raw machine identifier to the architecture name used in downloads.
pub fn infer_arch_from(machine: &str) -> String {
    match machine {
        "AMD64" | "amd64" | "x64" => "x86_64",
        "ARM64" => "arm64",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AMD64", "x86_64")]
    #[case("amd64", "x86_64")]
    #[case("x64", "x86_64")]
    #[case("x86_64", "x86_64")]
    #[case("ARM64", "arm64")]
    #[case("aarch64", "aarch64")]
    #[case("s390x", "s390x")]
    #[case("ppc64le", "ppc64le")]
    fn test_infer_arch_from(#[case] machine: &str, #[case] expected: &str) {
        assert_eq!(infer_arch_from(machine), expected);
    }

    #[test]
    fn test_infer_arch_is_not_empty() {
        assert!(!infer_arch().is_empty());
    }
}
