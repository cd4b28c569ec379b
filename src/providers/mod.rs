//! Provider adapters.
//!
//! A provider owns the remote side of a project's environment: linking a
//! local project to a remote one, reading the remote env, and pushing keys.
//! The orchestrator only talks to providers through [`ProviderAction`] and
//! treats each call as opaque pass/fail.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{DeployTarget, EffectiveOptions, ProjectConfig};
use crate::env::{diff_key_values, EnvDiff, EnvMap};
use crate::error::{FleetError, Result};

pub mod virtual_provider;

pub use virtual_provider::VirtualProvider;

/// What a provider needs to know about the project it acts on.
#[derive(Debug, Clone)]
pub struct ProviderContext<'a> {
    pub workspace_root: &'a Path,
    pub project: &'a ProjectConfig,
    pub target: DeployTarget,
    /// Linked remote project, once known.
    pub project_id: Option<String>,
}

impl<'a> ProviderContext<'a> {
    pub fn new(workspace_root: &'a Path, project: &'a ProjectConfig, target: DeployTarget) -> Self {
        Self {
            workspace_root,
            project,
            target,
            project_id: None,
        }
    }

    /// Absolute project directory.
    pub fn project_dir(&self) -> PathBuf {
        self.workspace_root.join(&self.project.path)
    }
}

/// Keys a sync wrote and keys it left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub set: Vec<String>,
    pub skipped: Vec<String>,
}

/// A provider adapter.
pub trait ProviderAction {
    /// Registry id, matched against a project's `provider` field.
    fn id(&self) -> &str;

    /// Link the project to a remote project and return its id.
    fn link(&self, ctx: &ProviderContext<'_>) -> Result<String>;

    /// Read the remote environment for the context's target.
    fn remote_env(&self, ctx: &ProviderContext<'_>) -> Result<EnvMap>;

    /// Push the (already filtered) local env.
    fn sync(
        &self,
        ctx: &ProviderContext<'_>,
        options: &EffectiveOptions,
        env: &EnvMap,
    ) -> Result<SyncOutcome>;

    /// Compare local and remote maps.
    fn diff(&self, _ctx: &ProviderContext<'_>, local: &EnvMap, remote: &EnvMap) -> Result<EnvDiff> {
        Ok(diff_key_values(local, remote))
    }
}

/// Provider adapters by id.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn ProviderAction>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in providers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(VirtualProvider::new()));
        registry
    }

    pub fn register(&mut self, provider: Box<dyn ProviderAction>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Look up a provider.
    ///
    /// # Errors
    ///
    /// `UnknownProvider` when nothing is registered under `id`.
    pub fn get(&self, id: &str) -> Result<&dyn ProviderAction> {
        self.providers
            .get(id)
            .map(|p| p.as_ref())
            .ok_or_else(|| FleetError::UnknownProvider {
                provider: id.to_string(),
            })
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
