//! Glob-style key filtering.
//!
//! Patterns are literal variable names with an optional single trailing `*`
//! meaning "any suffix". Matching is case-sensitive and exact outside the
//! wildcard. A pattern is compiled once into a prefix (and, for literal
//! patterns, an exact flag) instead of a regex.

use std::fmt;

/// A compiled key pattern.
///
/// # Example
///
/// ```
/// use fleetenv::env::KeyPattern;
///
/// let pattern = KeyPattern::new("NEXT_PUBLIC_*");
/// assert!(pattern.matches("NEXT_PUBLIC_SITE_URL"));
/// assert!(!pattern.matches("DATABASE_URL"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    prefix: String,
    wildcard: bool,
}

impl KeyPattern {
    /// Compile a pattern string.
    pub fn new(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => Self {
                prefix: prefix.to_string(),
                wildcard: true,
            },
            None => Self {
                prefix: pattern.to_string(),
                wildcard: false,
            },
        }
    }

    /// Check whether a key matches this pattern.
    pub fn matches(&self, key: &str) -> bool {
        if self.wildcard {
            key.starts_with(&self.prefix)
        } else {
            key == self.prefix
        }
    }

    /// Whether this pattern ends with the wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wildcard {
            write!(f, "{}*", self.prefix)
        } else {
            write!(f, "{}", self.prefix)
        }
    }
}

/// Split a comma-separated pattern list.
///
/// Entries are trimmed and empty entries dropped. `None` yields an empty list.
///
/// ```
/// use fleetenv::env::to_patterns;
///
/// assert_eq!(to_patterns(Some("A,B , C")), vec!["A", "B", "C"]);
/// assert!(to_patterns(None).is_empty());
/// ```
pub fn to_patterns(csv: Option<&str>) -> Vec<String> {
    csv.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Check a key against a single pattern string.
pub fn match_pattern(key: &str, pattern: &str) -> bool {
    KeyPattern::new(pattern).matches(key)
}

/// Decide whether a key passes the only/ignore lists.
///
/// A key is allowed iff `only` is empty or one of its patterns matches, and
/// no `ignore` pattern matches. Ignore is evaluated last and wins.
pub fn allow_key<S: AsRef<str>>(key: &str, only: &[S], ignore: &[S]) -> bool {
    if !only.is_empty() && !only.iter().any(|p| match_pattern(key, p.as_ref())) {
        return false;
    }
    !ignore.iter().any(|p| match_pattern(key, p.as_ref()))
}

/// Precompiled only/ignore filter for repeated use over a whole env map.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    only: Vec<KeyPattern>,
    ignore: Vec<KeyPattern>,
}

impl KeyFilter {
    /// Compile a filter from pattern lists.
    pub fn new<S: AsRef<str>>(only: &[S], ignore: &[S]) -> Self {
        Self {
            only: only.iter().map(|p| KeyPattern::new(p.as_ref())).collect(),
            ignore: ignore.iter().map(|p| KeyPattern::new(p.as_ref())).collect(),
        }
    }

    /// Same decision as [`allow_key`].
    pub fn allows(&self, key: &str) -> bool {
        if !self.only.is_empty() && !self.only.iter().any(|p| p.matches(key)) {
            return false;
        }
        !self.ignore.iter().any(|p| p.matches(key))
    }

    /// Keep only allowed entries of a map.
    pub fn apply(&self, map: &super::EnvMap) -> super::EnvMap {
        map.iter()
            .filter(|(k, _)| self.allows(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
