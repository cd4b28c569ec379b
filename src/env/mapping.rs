//! Key rename and value transforms applied to a loaded env map.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::EnvMap;

/// A value transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Base64,
    Trim,
    Upper,
    Lower,
}

impl Transform {
    pub fn apply(self, value: &str) -> String {
        match self {
            Transform::Base64 => BASE64_STANDARD.encode(value.as_bytes()),
            Transform::Trim => value.trim().to_string(),
            Transform::Upper => value.to_uppercase(),
            Transform::Lower => value.to_lowercase(),
        }
    }
}

/// Mapping document: `{"rename": {"FROM": "TO"}, "transform": {"KEY": "base64"}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvMapping {
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    #[serde(default)]
    pub transform: BTreeMap<String, Transform>,
}

impl EnvMapping {
    /// Load a mapping file.
    ///
    /// Returns `None` when the file is missing or is not a valid mapping
    /// document; callers then leave the env map unchanged.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Mapping file {} not loaded: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                tracing::warn!("Ignoring invalid mapping file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Apply the mapping to every entry.
    ///
    /// Each value is transformed under its original key, the key is renamed,
    /// and the value is transformed again under its (possibly unchanged)
    /// final key.
    pub fn apply(&self, vars: &EnvMap) -> EnvMap {
        let mut out = EnvMap::new();
        for (key, value) in vars {
            let mut value = match self.transform.get(key) {
                Some(t) => t.apply(value),
                None => value.clone(),
            };
            let new_key = self.rename.get(key).unwrap_or(key);
            // Runs even when the key was not renamed, so such keys are
            // transformed twice.
            if let Some(t) = self.transform.get(new_key) {
                value = t.apply(&value);
            }
            out.insert(new_key.clone(), value);
        }
        out
    }
}
