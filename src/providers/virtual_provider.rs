//! Hermetic provider backed by dotenv files inside the workspace.
//!
//! The "remote" env for a project and target lives at
//! `<root>/.fleetenv/virtual/<project>/<target>.env`. Useful for dry
//! rehearsals of a run and for tests.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use super::{ProviderAction, ProviderContext, SyncOutcome};
use crate::config::EffectiveOptions;
use crate::env::{EnvFileParser, EnvMap};
use crate::error::Result;
use crate::state::WORKSPACE_DATA_DIR;

/// Provider id.
pub const VIRTUAL_PROVIDER_ID: &str = "virtual";

#[derive(Debug, Clone, Default)]
pub struct VirtualProvider;

impl VirtualProvider {
    pub fn new() -> Self {
        Self
    }

    /// Path of the stored remote env.
    pub fn remote_file(ctx: &ProviderContext<'_>) -> PathBuf {
        ctx.workspace_root
            .join(WORKSPACE_DATA_DIR)
            .join("virtual")
            .join(&ctx.project.name)
            .join(format!("{}.env", ctx.target))
    }
}

impl ProviderAction for VirtualProvider {
    fn id(&self) -> &str {
        VIRTUAL_PROVIDER_ID
    }

    fn link(&self, ctx: &ProviderContext<'_>) -> Result<String> {
        Ok(format!("virtual-{}", ctx.project.name))
    }

    fn remote_env(&self, ctx: &ProviderContext<'_>) -> Result<EnvMap> {
        let path = Self::remote_file(ctx);
        if !path.exists() {
            return Ok(EnvMap::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read remote env {}", path.display()))?;
        // Stored values are literal, so skip the loader's trim and expansion.
        Ok(EnvFileParser::parse(&content))
    }

    fn sync(
        &self,
        ctx: &ProviderContext<'_>,
        _options: &EffectiveOptions,
        env: &EnvMap,
    ) -> Result<SyncOutcome> {
        let mut remote = self.remote_env(ctx)?;
        let mut outcome = SyncOutcome::default();

        for (key, value) in env {
            if remote.get(key) == Some(value) {
                outcome.skipped.push(key.clone());
            } else {
                remote.insert(key.clone(), value.clone());
                outcome.set.push(key.clone());
            }
        }

        if !outcome.set.is_empty() {
            let path = Self::remote_file(ctx);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, EnvFileParser::render(&remote))
                .with_context(|| format!("Failed to write remote env {}", path.display()))?;
        }

        tracing::debug!(
            "virtual sync for {}: {} set, {} unchanged",
            ctx.project.name,
            outcome.set.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_effective_options, CliOverrides, DeployTarget, Policy, ProjectConfig};
    use tempfile::TempDir;

    fn project() -> ProjectConfig {
        ProjectConfig {
            name: "web".into(),
            path: "apps/web".into(),
            provider: VIRTUAL_PROVIDER_ID.into(),
            ..Default::default()
        }
    }

    fn options(project: &ProjectConfig) -> EffectiveOptions {
        resolve_effective_options(&Policy::default(), project, &CliOverrides::default())
    }

    fn map(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn link_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let ctx = ProviderContext::new(temp.path(), &project, DeployTarget::Preview);
        assert_eq!(VirtualProvider::new().link(&ctx).unwrap(), "virtual-web");
    }

    #[test]
    fn missing_remote_is_empty() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let ctx = ProviderContext::new(temp.path(), &project, DeployTarget::Preview);
        assert!(VirtualProvider::new().remote_env(&ctx).unwrap().is_empty());
    }

    #[test]
    fn sync_upserts_and_skips_identical() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let ctx = ProviderContext::new(temp.path(), &project, DeployTarget::Prod);
        let provider = VirtualProvider::new();
        let opts = options(&project);

        let first = provider
            .sync(&ctx, &opts, &map(&[("A", "1"), ("B", "two words")]))
            .unwrap();
        assert_eq!(first.set, vec!["A", "B"]);

        let second = provider
            .sync(&ctx, &opts, &map(&[("A", "1"), ("B", "changed")]))
            .unwrap();
        assert_eq!(second.set, vec!["B"]);
        assert_eq!(second.skipped, vec!["A"]);

        let remote = provider.remote_env(&ctx).unwrap();
        assert_eq!(remote, map(&[("A", "1"), ("B", "changed")]));
        assert!(temp.path().join(".fleetenv/virtual/web/prod.env").exists());
    }

    #[test]
    fn sync_keeps_remote_only_keys() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let ctx = ProviderContext::new(temp.path(), &project, DeployTarget::Preview);
        let provider = VirtualProvider::new();
        let opts = options(&project);

        provider.sync(&ctx, &opts, &map(&[("OLD", "x")])).unwrap();
        provider.sync(&ctx, &opts, &map(&[("NEW", "y")])).unwrap();

        let remote = provider.remote_env(&ctx).unwrap();
        assert_eq!(remote.len(), 2);
    }

    #[test]
    fn targets_are_stored_separately() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let provider = VirtualProvider::new();
        let opts = options(&project);
        let prod = ProviderContext::new(temp.path(), &project, DeployTarget::Prod);
        let preview = ProviderContext::new(temp.path(), &project, DeployTarget::Preview);

        provider.sync(&prod, &opts, &map(&[("A", "1")])).unwrap();

        assert!(provider.remote_env(&preview).unwrap().is_empty());
    }

    #[test]
    fn default_diff_compares_maps() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let ctx = ProviderContext::new(temp.path(), &project, DeployTarget::Prod);
        let diff = VirtualProvider::new()
            .diff(&ctx, &map(&[("A", "1")]), &map(&[("B", "2")]))
            .unwrap();
        assert_eq!(diff.added, vec!["A"]);
        assert_eq!(diff.removed, vec!["B"]);
    }
}
