use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `MAJOR.MINOR`, `MAJOR.MINOR.PATCH` or `MAJOR.MINOR.PATCH-TAGNUM`.
regex!(VERSION_REGEX, r"^(\d+)\.(\d+)(?:\.(\d+)(?:-([a-z]+)(\d+))?)?$");
