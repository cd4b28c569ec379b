//! Persisted provider linkage state.
//!
//! The state document records, per provider and deploy target, which remote
//! project a workspace is linked to:
//!
//! ```json
//! { "virtual": { "preview": { "projectId": "virtual-web", "linkedAt": "2025-01-01T00:00:00Z" } } }
//! ```
//!
//! Reads never fail. Each candidate file is tried in order and the first one
//! that reads and parses wins; if none does the state is empty. Writes always
//! go to the primary file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::paths::{PlatformInfo, StateEnv, StateLocation};
use crate::config::DeployTarget;
use crate::error::Result;

/// Linkage for one deploy target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// When the link was recorded. Absent in older state files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_at: Option<DateTime<Utc>>,
}

/// Linkage for one provider, keyed by deploy target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod: Option<TargetState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<TargetState>,
}

impl ProviderState {
    fn target(&self, target: DeployTarget) -> Option<&TargetState> {
        match target {
            DeployTarget::Prod => self.prod.as_ref(),
            DeployTarget::Preview => self.preview.as_ref(),
        }
    }

    fn target_mut(&mut self, target: DeployTarget) -> &mut TargetState {
        let slot = match target {
            DeployTarget::Prod => &mut self.prod,
            DeployTarget::Preview => &mut self.preview,
        };
        slot.get_or_insert_with(TargetState::default)
    }
}

/// The whole state document, keyed by provider id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedState {
    pub providers: BTreeMap<String, ProviderState>,
}

impl PersistedState {
    /// Linked project id for a provider and target.
    pub fn project_id(&self, provider: &str, target: DeployTarget) -> Option<&str> {
        self.providers
            .get(provider)?
            .target(target)?
            .project_id
            .as_deref()
    }

    /// Record a linked project id.
    pub fn set_project_id(
        &mut self,
        provider: &str,
        target: DeployTarget,
        project_id: impl Into<String>,
    ) {
        let slot = self
            .providers
            .entry(provider.to_string())
            .or_default()
            .target_mut(target);
        slot.project_id = Some(project_id.into());
        slot.linked_at = Some(Utc::now());
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Reads and writes the state document.
#[derive(Debug, Clone)]
pub struct StateStore {
    location: StateLocation,
}

impl StateStore {
    /// Create a store for a workspace root.
    pub fn new(platform: &PlatformInfo, env: &StateEnv, workspace_root: &Path) -> Self {
        Self::with_location(StateLocation::resolve(platform, env, workspace_root))
    }

    pub fn with_location(location: StateLocation) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &StateLocation {
        &self.location
    }

    /// Load state from the first readable candidate, or empty state.
    pub fn read(&self) -> PersistedState {
        for path in self.location.candidates() {
            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("State file {} not readable: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str(&content) {
                Ok(state) => {
                    tracing::debug!("Loaded state from {}", path.display());
                    return state;
                }
                Err(e) => {
                    tracing::warn!("Ignoring corrupt state file {}: {}", path.display(), e);
                }
            }
        }
        PersistedState::default()
    }

    /// Write state to the primary file as pretty JSON with a trailing newline.
    pub fn write(&self, state: &PersistedState) -> Result<()> {
        fs::create_dir_all(&self.location.dir)?;
        let mut content = serde_json::to_string_pretty(state).map_err(anyhow::Error::from)?;
        content.push('\n');
        fs::write(&self.location.file, content)?;
        tracing::debug!("Wrote state to {}", self.location.file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::paths::OsFamily;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir, state_in_project: bool) -> StateStore {
        let platform = PlatformInfo::new(OsFamily::Unix, temp.path().join("home"));
        let env = StateEnv {
            state_in_project,
            ..Default::default()
        };
        StateStore::new(&platform, &env, &temp.path().join("ws"))
    }

    #[test]
    fn missing_state_reads_empty() {
        let temp = TempDir::new().unwrap();
        assert!(store_in(&temp, false).read().is_empty());
    }

    #[test]
    fn write_then_read() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        let mut state = PersistedState::default();
        state.set_project_id("virtual", DeployTarget::Preview, "virtual-web");

        store.write(&state).unwrap();

        assert_eq!(store.read(), state);
        let content = fs::read_to_string(&store.location().file).unwrap();
        assert!(content.ends_with("}\n"));
        assert!(content.contains("\"projectId\": \"virtual-web\""));
    }

    #[test]
    fn reads_legacy_file_when_primary_missing() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        let legacy = &store.location().legacy_file;
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        fs::write(legacy, r#"{"virtual": {"prod": {"projectId": "old"}}}"#).unwrap();

        let state = store.read();

        assert_eq!(state.project_id("virtual", DeployTarget::Prod), Some("old"));
    }

    #[test]
    fn corrupt_primary_falls_back_to_legacy() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        let location = store.location().clone();
        fs::create_dir_all(&location.dir).unwrap();
        fs::write(&location.file, "{ corrupt").unwrap();
        fs::create_dir_all(location.legacy_file.parent().unwrap()).unwrap();
        fs::write(&location.legacy_file, r#"{"virtual": {"preview": {"projectId": "legacy"}}}"#)
            .unwrap();

        let state = store.read();

        assert_eq!(state.project_id("virtual", DeployTarget::Preview), Some("legacy"));
    }

    #[test]
    fn corrupt_everywhere_reads_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, true);
        let location = store.location().clone();
        fs::create_dir_all(&location.dir).unwrap();
        fs::write(&location.file, "not json").unwrap();

        assert!(store.read().is_empty());
    }

    #[test]
    fn write_never_touches_legacy_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, false);
        let legacy = store.location().legacy_file.clone();
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        fs::write(&legacy, r#"{"virtual": {"prod": {"projectId": "old"}}}"#).unwrap();

        let mut state = store.read();
        state.set_project_id("virtual", DeployTarget::Preview, "new");
        store.write(&state).unwrap();

        let legacy_content = fs::read_to_string(&legacy).unwrap();
        assert!(!legacy_content.contains("new"));
        assert_eq!(
            store.read().project_id("virtual", DeployTarget::Prod),
            Some("old")
        );
    }

    #[test]
    fn workspace_mode_writes_into_workspace() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp, true);
        store.write(&PersistedState::default()).unwrap();
        assert!(temp.path().join("ws/.fleetenv/state.json").exists());
    }

    #[test]
    fn project_id_lookup_per_target() {
        let mut state = PersistedState::default();
        state.set_project_id("virtual", DeployTarget::Prod, "p");
        assert_eq!(state.project_id("virtual", DeployTarget::Prod), Some("p"));
        assert_eq!(state.project_id("virtual", DeployTarget::Preview), None);
        assert_eq!(state.project_id("other", DeployTarget::Prod), None);
    }

    #[test]
    fn linking_records_timestamp() {
        let before = Utc::now();
        let mut state = PersistedState::default();
        state.set_project_id("virtual", DeployTarget::Prod, "p");

        let linked_at = state.providers["virtual"].prod.as_ref().unwrap().linked_at.unwrap();
        assert!(linked_at >= before);

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"linkedAt\""));
    }

    #[test]
    fn empty_state_serializes_as_empty_object() {
        let json = serde_json::to_string(&PersistedState::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
