use once_cell::sync::Lazy;
use regex::Regex;

static DRIVE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]):").unwrap());

/// A canonical, case-normalized file identifier.
///
/// Two `CanonicalPath`s are equal iff they refer to the same source file
/// under the host's case-sensitivity policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rewrite `path` in POSIX form in one pass: either separator style is
/// accepted, empty and `.` segments drop out, and `..` consumes the segment
/// before it.
pub fn normalize_path(path: &str) -> String {
    let rooted = path.starts_with('/') || path.starts_with('\\');
    let mut kept: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                kept.pop();
            }
            _ => kept.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    if rooted {
        normalized.push('/');
    }
    normalized.push_str(&kept.join("/"));
    normalized
}

/// Produce the canonical form of `file_name` under the given case policy.
///
/// Drive letters are always folded to lower case; the rest of the path only
/// when the host is case-insensitive.
pub fn to_canonical_path(file_name: &str, case_sensitive: bool) -> CanonicalPath {
    let normalized = normalize_path(file_name);
    let normalized = DRIVE_PREFIX
        .replace(&normalized, |caps: &regex::Captures<'_>| {
            format!("{}:", caps[1].to_lowercase())
        })
        .into_owned();
    if case_sensitive {
        CanonicalPath(normalized)
    } else {
        CanonicalPath(normalized.to_lowercase())
    }
}
