//! Key/value diff between a local and a remote environment snapshot.

use serde::Serialize;
use std::collections::BTreeSet;

use super::EnvMap;

/// A key present on both sides with different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedKey {
    pub key: String,
    pub local: String,
    pub remote: String,
}

/// Classification of keys between two env maps.
///
/// `added` is local-only, `removed` is remote-only, `changed` differs in
/// value. The three lists are disjoint and each is in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<ChangedKey>,
}

impl EnvDiff {
    /// True when no key differs.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of differing keys.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Keys of the `changed` entries.
    pub fn changed_keys(&self) -> Vec<&str> {
        self.changed.iter().map(|c| c.key.as_str()).collect()
    }
}

/// Compute the diff of `local` against `remote`.
///
/// # Example
///
/// ```
/// use fleetenv::env::{diff_key_values, EnvMap};
///
/// let local: EnvMap = [("A", "1"), ("B", "x")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
/// let remote: EnvMap = [("B", "y"), ("D", "4")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
///
/// let diff = diff_key_values(&local, &remote);
/// assert_eq!(diff.added, vec!["A"]);
/// assert_eq!(diff.removed, vec!["D"]);
/// assert_eq!(diff.changed[0].key, "B");
/// ```
pub fn diff_key_values(local: &EnvMap, remote: &EnvMap) -> EnvDiff {
    let keys: BTreeSet<&String> = local.keys().chain(remote.keys()).collect();

    let mut diff = EnvDiff::default();
    for key in keys {
        match (local.get(key), remote.get(key)) {
            (Some(_), None) => diff.added.push(key.clone()),
            (None, Some(_)) => diff.removed.push(key.clone()),
            (Some(l), Some(r)) if l != r => diff.changed.push(ChangedKey {
                key: key.clone(),
                local: l.clone(),
                remote: r.clone(),
            }),
            _ => {}
        }
    }
    diff
}
