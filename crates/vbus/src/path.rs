// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dotted-path joining, wildcard detection, and segment sanitization.

/// Join non-empty path segments with `.`, eliding empty ones.
///
/// `join(&["a", "", "b"]) == "a.b"`, `join(&[]) == ""`.
pub fn join<'a, I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str> + 'a,
{
    segments
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a dotted path into its segments, dropping empty ones produced by
/// leading/trailing/double dots.
pub fn split(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

/// True if `segment` is a bus-level wildcard (`*` or `>`).
pub fn is_wildcard(segment: &str) -> bool {
    segment == "*" || segment == ">"
}

/// True if any segment of `path` is a wildcard.
pub fn contains_wildcard(path: &str) -> bool {
    split(path).iter().any(|s| is_wildcard(s))
}

/// Characters the spec's open question restricts path segments to:
/// `[A-Za-z0-9_\-:]`. `.` is substituted with `_` since it is the path
/// separator.
pub fn sanitize_segment(segment: &str) -> String {
    segment.replace('.', "_")
}

/// Build the regex used by [`crate::bus::BusClient::subscribe`] to recapture
/// wildcard bindings from an incoming subject: `*` → `([^.]+)`, `>` → `(.+)`.
pub fn wildcard_regex(path: &str) -> String {
    let mut out = String::with_capacity(path.len() * 2);
    out.push('^');
    for ch in path.chars() {
        match ch {
            '.' => out.push_str(r"\."),
            '*' => out.push_str(r"([^.]+)"),
            '>' => out.push_str(r"(.+)"),
            other => out.push(other),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_elides_empty_segments() {
        assert_eq!(join(["a", "", "b"]), "a.b");
        assert_eq!(join(Vec::<&str>::new()), "");
        assert_eq!(join(["solo"]), "solo");
    }

    #[test]
    fn split_drops_empties() {
        assert_eq!(split("a..b."), vec!["a", "b"]);
        assert_eq!(split(""), Vec::<&str>::new());
    }

    #[test]
    fn wildcard_detection() {
        assert!(is_wildcard("*"));
        assert!(is_wildcard(">"));
        assert!(!is_wildcard("a"));
        assert!(contains_wildcard("a.*.b"));
        assert!(contains_wildcard("a.>"));
        assert!(!contains_wildcard("a.b.c"));
    }

    #[test]
    fn sanitize_replaces_dots_only() {
        assert_eq!(sanitize_segment("a.b.c"), "a_b_c");
        assert_eq!(sanitize_segment("a-b_c:d"), "a-b_c:d");
    }

    #[test]
    fn wildcard_regex_captures_single_and_remainder() {
        let re = regex::Regex::new(&wildcard_regex("system.test.*.dev.>")).unwrap();
        let caps = re.captures("system.test.h1.dev.foo.bar").unwrap();
        assert_eq!(&caps[1], "h1");
        assert_eq!(&caps[2], "foo.bar");
    }
}
