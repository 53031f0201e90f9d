use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// A `KEY=value` line of an os-release file; the value may be single or double quoted.
const VALUE: &str = r#"[ \t]*=[ \t]*(?:"([^"]*)"|'([^']*)'|([^\s"']*))[ \t]*\r?$"#;

regex!(ID_REGEX, format!(r"(?m)^[ \t]*ID{VALUE}").as_str());
regex!(VERSION_ID_REGEX, format!(r"(?m)^[ \t]*VERSION_ID{VALUE}").as_str());
