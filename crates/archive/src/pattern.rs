use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use glob::Pattern;

enum Segment {
    /// `**`: any number of path segments, including none.
    AnyDepth,
    Glob(Pattern),
}

/// An include pattern matched against archive member paths.
///
/// The pattern is split on `/` and compared segment by segment. `**` stands
/// for any number of segments; every other segment is a shell glob that
/// cannot cross a `/`. Once every pattern segment has matched, the remainder
/// of the member path is accepted, so `bin` selects everything below `bin/`.
pub(crate) struct MemberPattern {
    segments: Vec<Segment>,
}

impl MemberPattern {
    pub(crate) fn new(pattern: &str) -> Result<Self> {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(|s| match s {
                "**" => Ok(Segment::AnyDepth),
                glob => Pattern::new(glob).map(Segment::Glob).or_raise(|| ErrorKind::InvalidPattern(pattern.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub(crate) fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        matches(&self.segments, path)
    }
}

fn matches<S: AsRef<str>>(pattern: &[Segment], path: &[S]) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return true;
    };
    if path.is_empty() {
        return false;
    }
    match head {
        Segment::AnyDepth => (0..path.len()).any(|i| matches(rest, &path[i..])),
        Segment::Glob(glob) => glob.matches(path[0].as_ref()) && matches(rest, &path[1..]),
    }
}
