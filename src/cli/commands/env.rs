//! Env commands.
//!
//! - `fleetenv env print` shows what a sync of one project would see
//! - `fleetenv env pull` writes a project's remote env to a local file
//! - `fleetenv env validate` checks a project's env against schemas

use std::collections::BTreeMap;
use std::fs;

use anyhow::Context;
use serde::Serialize;

use crate::cli::args::{EnvPrintArgs, EnvPullArgs, EnvValidateArgs};
use crate::config::{resolve_effective_options, CliOverrides};
use crate::env::{mask, validate_env, EnvFileParser, SchemaType};
use crate::error::Result;
use crate::providers::{ProviderContext, ProviderRegistry};
use crate::runner::{ensure_linked, load_project_env};
use crate::ui::UserInterface;

use super::dispatcher::{
    find_project, parse_target, Command, CommandResult, Workspace, EXIT_FAILURE, EXIT_NO_CONFIG,
};

/// The `env print` command implementation.
pub struct EnvPrintCommand<'a> {
    workspace: &'a Workspace,
    args: EnvPrintArgs,
}

impl<'a> EnvPrintCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: EnvPrintArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for EnvPrintCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) = self.workspace.load_config(ui)? else {
            return Ok(CommandResult::failure(EXIT_NO_CONFIG));
        };
        let Some(project) = find_project(&config, &self.args.project, ui) else {
            return Ok(CommandResult::failure(EXIT_FAILURE));
        };
        let target = parse_target(&self.args.env)?;

        let options = resolve_effective_options(&config.policy, project, &CliOverrides::default());
        let env = options.key_filter().apply(&load_project_env(
            &self.workspace.root,
            project,
            target,
            &self.workspace.env,
        ));
        let masked: BTreeMap<&str, String> =
            env.iter().map(|(k, v)| (k.as_str(), mask(v))).collect();

        if self.args.json {
            ui.message(&serde_json::to_string_pretty(&masked).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!(
            "{} ({}, {})",
            project.name,
            target,
            project.env_file(target)
        ));
        if masked.is_empty() {
            ui.warning("No variables loaded");
        }
        for (key, value) in &masked {
            ui.message(&format!("{}={}", key, value));
        }
        Ok(CommandResult::success())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullOutput<'a> {
    ok: bool,
    project: &'a str,
    provider: &'a str,
    target: &'a str,
    project_id: &'a str,
    out: String,
    count: usize,
}

/// The `env pull` command implementation.
pub struct EnvPullCommand<'a> {
    workspace: &'a Workspace,
    args: EnvPullArgs,
}

impl<'a> EnvPullCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: EnvPullArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for EnvPullCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) = self.workspace.load_config(ui)? else {
            return Ok(CommandResult::failure(EXIT_NO_CONFIG));
        };
        let Some(project) = find_project(&config, &self.args.project, ui) else {
            return Ok(CommandResult::failure(EXIT_FAILURE));
        };
        let target = parse_target(&self.args.env)?;

        let registry = ProviderRegistry::with_builtins();
        let provider = registry.get(&project.provider)?;
        let mut ctx = ProviderContext::new(&self.workspace.root, project, target);
        let store = self.workspace.state_store(&ctx.project_dir());
        let project_id = ensure_linked(provider, &ctx, &store)?;
        ctx.project_id = Some(project_id.clone());

        let remote = provider.remote_env(&ctx)?;
        let out = ctx
            .project_dir()
            .join(self.args.out.as_deref().unwrap_or(target.pull_file()));
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&out, EnvFileParser::render(&remote))
            .with_context(|| format!("Failed to write {}", out.display()))?;
        tracing::debug!("Pulled {} key(s) to {}", remote.len(), out.display());

        if self.args.json {
            let output = PullOutput {
                ok: true,
                project: &project.name,
                provider: provider.id(),
                target: target.as_str(),
                project_id: &project_id,
                out: out.display().to_string(),
                count: remote.len(),
            };
            ui.message(&serde_json::to_string_pretty(&output).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::success());
        }

        ui.success(&format!(
            "Pulled {} key(s) from {} ({}) to {}",
            remote.len(),
            project.name,
            target,
            out.display()
        ));
        Ok(CommandResult::success())
    }
}

/// The `env validate` command implementation.
pub struct EnvValidateCommand<'a> {
    workspace: &'a Workspace,
    args: EnvValidateArgs,
}

impl<'a> EnvValidateCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: EnvValidateArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for EnvValidateCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) = self.workspace.load_config(ui)? else {
            return Ok(CommandResult::failure(EXIT_NO_CONFIG));
        };
        let Some(project) = find_project(&config, &self.args.project, ui) else {
            return Ok(CommandResult::failure(EXIT_FAILURE));
        };
        let target = parse_target(&self.args.env)?;
        let schema_type: SchemaType = self.args.schema_type.parse()?;

        let env = load_project_env(&self.workspace.root, project, target, &self.workspace.env);
        let report = validate_env(&env, &self.args.schema, schema_type, &self.workspace.root)?;

        if self.args.json {
            ui.message(&serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::from_ok(report.ok));
        }

        if report.ok {
            ui.success(&format!(
                "{}: all {} required key(s) present",
                project.name,
                report.required.len()
            ));
        } else {
            ui.error(&format!("{}: env does not satisfy the schema", project.name));
            for key in &report.missing {
                ui.message(&format!("  missing {}", key));
            }
            for violation in &report.violations {
                ui.message(&format!("  {}", violation));
            }
        }
        if ui.output_mode().shows_details() && !report.unknown.is_empty() {
            ui.message(&format!("  not in schema: {}", report.unknown.join(", ")));
        }

        Ok(CommandResult::from_ok(report.ok))
    }
}
