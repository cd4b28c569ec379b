//! Workspace run orchestration.
//!
//! The orchestrator plans the selected projects into dependency layers and
//! evaluates each project in order: resolve its effective options, load and
//! filter its local env, then diff and/or sync through its provider. Every
//! selected project ends with exactly one [`ProjectOutcome`], even when the
//! run fails part way.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::config::{
    resolve_effective_options, CliOverrides, DeployTarget, EffectiveOptions, ProjectConfig,
    WorkspaceConfig,
};
use crate::env::{load_layered_env, mask, EnvContext, EnvDiff, EnvMap, EnvMapping};
use crate::error::Result;
use crate::providers::{ProviderAction, ProviderContext, ProviderRegistry, SyncOutcome};
use crate::state::{PlatformInfo, StateEnv, StateStore};
use crate::ui::UserInterface;

use super::dependency::{plan, Selection};

/// Options for a workspace run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Deploy target whose env files and remote env are used.
    pub target: DeployTarget,
    /// Compare local and remote env.
    pub diff_env: bool,
    /// Push local env to the provider.
    pub sync_env: bool,
    /// Report what a sync would push without linking or pushing.
    pub dry_run: bool,
    /// Stop after the first layer with a failed project.
    pub strict: bool,
    /// Running in CI. Skips confirmation.
    pub ci: bool,
    /// Skip confirmation.
    pub assume_yes: bool,
}

impl RunOptions {
    /// Whether a diff is computed. A run with neither mode set diffs.
    pub fn diffs(&self) -> bool {
        self.diff_env || !self.sync_env
    }

    fn needs_confirmation(&self) -> bool {
        !(self.assume_yes || self.ci || self.dry_run)
    }
}

/// Terminal status of one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Ok,
    Failed,
    Skipped,
}

/// A key and its masked value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedValue {
    pub key: String,
    pub value: String,
}

/// Result of evaluating one project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOutcome {
    pub project: String,
    pub provider: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<EffectiveOptions>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_diff_keys"
    )]
    pub diff: Option<EnvDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub would_set: Vec<MaskedValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl ProjectOutcome {
    fn new(project: &ProjectConfig) -> Self {
        Self {
            project: project.name.clone(),
            provider: project.provider.clone(),
            status: ProjectStatus::Ok,
            project_id: None,
            options: None,
            diff: None,
            sync: None,
            would_set: Vec::new(),
            reasons: Vec::new(),
        }
    }

    fn fail(&mut self, reason: impl Into<String>) {
        self.status = ProjectStatus::Failed;
        self.reasons.push(reason.into());
    }

    fn skip(&mut self, reason: impl Into<String>) {
        self.status = ProjectStatus::Skipped;
        self.reasons.push(reason.into());
    }

    pub fn is_failed(&self) -> bool {
        self.status == ProjectStatus::Failed
    }
}

/// Diffs leave the process with key names only.
fn serialize_diff_keys<S: Serializer>(
    diff: &Option<EnvDiff>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct DiffKeys<'a> {
        added: &'a [String],
        removed: &'a [String],
        changed: Vec<&'a str>,
    }

    diff.as_ref()
        .map(|d| DiffKeys {
            added: &d.added,
            removed: &d.removed,
            changed: d.changed_keys(),
        })
        .serialize(serializer)
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub ok: bool,
    pub target: DeployTarget,
    pub results: Vec<ProjectOutcome>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }
}

/// Progress events emitted during a run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A project is about to be evaluated.
    ProjectStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A project reached its terminal status.
    ProjectFinished { outcome: &'a ProjectOutcome },
}

/// Runs the selected projects of a workspace.
pub struct Orchestrator<'a> {
    config: &'a WorkspaceConfig,
    root: PathBuf,
    registry: &'a ProviderRegistry,
    env: &'a EnvContext,
    platform: PlatformInfo,
    state_env: StateEnv,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator for the host platform.
    pub fn new(
        config: &'a WorkspaceConfig,
        root: &Path,
        registry: &'a ProviderRegistry,
        env: &'a EnvContext,
    ) -> Self {
        Self {
            config,
            root: root.to_path_buf(),
            registry,
            env,
            platform: PlatformInfo::detect(),
            state_env: StateEnv::from_context(env),
        }
    }

    /// Use explicit platform facts for state resolution.
    pub fn with_platform(mut self, platform: PlatformInfo) -> Self {
        self.platform = platform;
        self
    }

    /// Run without progress reporting.
    pub fn run(
        &self,
        selection: &Selection,
        overrides: &CliOverrides,
        options: &RunOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<RunReport> {
        self.run_with_progress(selection, overrides, options, ui, |_, _| {})
    }

    /// Run and report progress through `on_progress`.
    ///
    /// # Errors
    ///
    /// Only planning errors (empty selection, dependency cycle) are returned
    /// as `Err`. Everything that goes wrong inside a project becomes a
    /// failed outcome with a reason.
    pub fn run_with_progress(
        &self,
        selection: &Selection,
        overrides: &CliOverrides,
        options: &RunOptions,
        ui: &mut dyn UserInterface,
        mut on_progress: impl FnMut(RunProgress<'_>, &mut dyn UserInterface),
    ) -> Result<RunReport> {
        let plan = plan(&self.config.projects, selection)?;
        let total = plan.project_count();
        tracing::info!(
            "Running {} project(s) in {} layer(s) for {}",
            total,
            plan.layers.len(),
            options.target
        );

        let mut results = Vec::with_capacity(total);
        let mut halted = false;

        for layer in &plan.layers {
            let mut layer_failed = false;

            for project in layer {
                on_progress(
                    RunProgress::ProjectStarting {
                        name: &project.name,
                        index: results.len(),
                        total,
                    },
                    &mut *ui,
                );

                let outcome = if halted {
                    let mut outcome = ProjectOutcome::new(project);
                    outcome.skip("Not run: an earlier layer failed in strict mode");
                    outcome
                } else {
                    self.run_project(project, overrides, options, ui)
                };

                layer_failed |= outcome.is_failed();
                on_progress(RunProgress::ProjectFinished { outcome: &outcome }, &mut *ui);
                results.push(outcome);
            }

            if options.strict && layer_failed && !halted {
                tracing::warn!("Strict mode: halting after failed layer");
                halted = true;
            }
        }

        let ok = !results.iter().any(ProjectOutcome::is_failed);
        Ok(RunReport {
            ok,
            target: options.target,
            results,
        })
    }

    /// Evaluate a single project. Never fails; errors become reasons.
    pub fn run_project(
        &self,
        project: &ProjectConfig,
        overrides: &CliOverrides,
        options: &RunOptions,
        ui: &mut dyn UserInterface,
    ) -> ProjectOutcome {
        let mut outcome = ProjectOutcome::new(project);
        if let Err(e) = self.evaluate(project, overrides, options, ui, &mut outcome) {
            tracing::debug!("{} failed: {}", project.name, e);
            outcome.fail(e.to_string());
        }
        outcome
    }

    /// Local env for a project after layering and mapping, before filtering.
    pub fn local_env(&self, project: &ProjectConfig, target: DeployTarget) -> EnvMap {
        load_project_env(&self.root, project, target, self.env)
    }

    /// State store for a project directory.
    pub fn state_store(&self, project: &ProjectConfig) -> StateStore {
        StateStore::new(&self.platform, &self.state_env, &self.root.join(&project.path))
    }

    fn evaluate(
        &self,
        project: &ProjectConfig,
        overrides: &CliOverrides,
        options: &RunOptions,
        ui: &mut dyn UserInterface,
        outcome: &mut ProjectOutcome,
    ) -> Result<()> {
        let effective = resolve_effective_options(&self.config.policy, project, overrides);
        outcome.options = Some(effective.clone());

        let provider = self.registry.get(&project.provider)?;
        let local = effective.key_filter().apply(&self.local_env(project, options.target));
        tracing::debug!("{}: {} local key(s) after filtering", project.name, local.len());

        let store = self.state_store(project);
        let state = store.read();
        let mut ctx = ProviderContext::new(&self.root, project, options.target);
        ctx.project_id = state
            .project_id(provider.id(), options.target)
            .map(String::from);
        outcome.project_id = ctx.project_id.clone();

        if options.diffs() {
            let diff = remote_diff(provider, &ctx, &local)?;
            let violations = fail_on_violations(&effective, &diff);
            outcome.diff = Some(diff);
            for reason in violations {
                outcome.fail(reason);
            }
        }

        if !options.sync_env || outcome.is_failed() {
            return Ok(());
        }

        if options.dry_run {
            outcome.would_set = local
                .iter()
                .map(|(key, value)| MaskedValue {
                    key: key.clone(),
                    value: mask(value),
                })
                .collect();
            return Ok(());
        }

        if ctx.project_id.is_none() {
            ctx.project_id = Some(ensure_linked(provider, &ctx, &store)?);
            outcome.project_id = ctx.project_id.clone();
        }

        if effective.has_fail_on() && outcome.diff.is_none() {
            let diff = remote_diff(provider, &ctx, &local)?;
            let violations = fail_on_violations(&effective, &diff);
            outcome.diff = Some(diff);
            if !violations.is_empty() {
                for reason in violations {
                    outcome.fail(reason);
                }
                return Ok(());
            }
        }

        if options.needs_confirmation() {
            let question = format!(
                "Push {} key(s) to {} ({})?",
                local.len(),
                project.name,
                options.target
            );
            if !ui.confirm(&question, false)? {
                outcome.skip("Sync declined");
                return Ok(());
            }
        }

        let result = provider.sync(&ctx, &effective, &local)?;
        tracing::info!(
            "Synced {}: {} set, {} unchanged",
            project.name,
            result.set.len(),
            result.skipped.len()
        );
        outcome.sync = Some(result);
        Ok(())
    }
}

/// Load a project's env file and its override, then apply its mapping file.
///
/// A missing or invalid mapping file leaves the env unchanged.
pub fn load_project_env(
    root: &Path,
    project: &ProjectConfig,
    target: DeployTarget,
    env: &EnvContext,
) -> EnvMap {
    let dir = root.join(&project.path);
    let local = load_layered_env(&dir, project.env_file(target), env);
    match &project.env_map_file {
        Some(file) => match EnvMapping::load(&dir.join(file)) {
            Some(mapping) => mapping.apply(&local),
            None => local,
        },
        None => local,
    }
}

/// The remote project id recorded for `ctx`, linking through the provider
/// and recording the new id when none is stored yet.
pub fn ensure_linked(
    provider: &dyn ProviderAction,
    ctx: &ProviderContext<'_>,
    store: &StateStore,
) -> Result<String> {
    let mut state = store.read();
    if let Some(id) = state.project_id(provider.id(), ctx.target) {
        return Ok(id.to_string());
    }

    let id = provider.link(ctx)?;
    tracing::info!("Linked {} to {} project {}", ctx.project.name, provider.id(), id);
    state.set_project_id(provider.id(), ctx.target, id.clone());
    store.write(&state)?;
    Ok(id)
}

fn remote_diff(
    provider: &dyn ProviderAction,
    ctx: &ProviderContext<'_>,
    local: &EnvMap,
) -> Result<EnvDiff> {
    let remote = provider.remote_env(ctx)?;
    provider.diff(ctx, local, &remote)
}

/// Reasons a diff violates the fail-on flags.
pub fn fail_on_violations(options: &EffectiveOptions, diff: &EnvDiff) -> Vec<String> {
    let mut reasons = Vec::new();
    if options.fail_on_add && !diff.added.is_empty() {
        reasons.push(format!(
            "failOnAdd: only in local env: {}",
            diff.added.join(", ")
        ));
    }
    if options.fail_on_remove && !diff.removed.is_empty() {
        reasons.push(format!(
            "failOnRemove: only in remote env: {}",
            diff.removed.join(", ")
        ));
    }
    reasons
}
