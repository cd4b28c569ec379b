//! State commands.
//!
//! `fleetenv state path|show|link` inspect and seed the persisted provider
//! linkage for a project directory, or for the workspace root when no
//! project is named.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::args::{StateLinkArgs, StateScopeArgs};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{
    find_project, parse_target, Command, CommandResult, Workspace, EXIT_FAILURE, EXIT_NO_CONFIG,
};

/// Directory whose state a command acts on.
enum Scope {
    Dir(PathBuf),
    Exit(CommandResult),
}

fn resolve_scope(
    workspace: &Workspace,
    project: Option<&str>,
    ui: &mut dyn UserInterface,
) -> Result<Scope> {
    let Some(name) = project else {
        return Ok(Scope::Dir(workspace.root.clone()));
    };
    let Some(config) = workspace.load_config(ui)? else {
        return Ok(Scope::Exit(CommandResult::failure(EXIT_NO_CONFIG)));
    };
    Ok(match find_project(&config, name, ui) {
        Some(p) => Scope::Dir(workspace.root.join(&p.path)),
        None => Scope::Exit(CommandResult::failure(EXIT_FAILURE)),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathOutput {
    file: PathBuf,
    legacy_file: PathBuf,
    candidates: Vec<PathBuf>,
}

/// The `state path` command implementation.
pub struct StatePathCommand<'a> {
    workspace: &'a Workspace,
    args: StateScopeArgs,
}

impl<'a> StatePathCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: StateScopeArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for StatePathCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let dir = match resolve_scope(self.workspace, self.args.project.as_deref(), ui)? {
            Scope::Dir(dir) => dir,
            Scope::Exit(result) => return Ok(result),
        };
        let store = self.workspace.state_store(&dir);
        let location = store.location();

        if self.args.json {
            let output = PathOutput {
                file: location.file.clone(),
                legacy_file: location.legacy_file.clone(),
                candidates: location.candidates().iter().map(|p| p.to_path_buf()).collect(),
            };
            ui.message(&serde_json::to_string_pretty(&output).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::success());
        }

        ui.message(&format!("state:  {}", location.file.display()));
        if location.legacy_file != location.file {
            ui.message(&format!("legacy: {} (read only)", location.legacy_file.display()));
        }
        Ok(CommandResult::success())
    }
}

/// The `state show` command implementation.
pub struct StateShowCommand<'a> {
    workspace: &'a Workspace,
    args: StateScopeArgs,
}

impl<'a> StateShowCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: StateScopeArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for StateShowCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let dir = match resolve_scope(self.workspace, self.args.project.as_deref(), ui)? {
            Scope::Dir(dir) => dir,
            Scope::Exit(result) => return Ok(result),
        };
        let state = self.workspace.state_store(&dir).read();

        if !self.args.json && state.is_empty() {
            ui.warning("No provider linkage recorded");
            return Ok(CommandResult::success());
        }
        ui.message(&serde_json::to_string_pretty(&state).map_err(anyhow::Error::from)?);
        Ok(CommandResult::success())
    }
}

/// The `state link` command implementation.
pub struct StateLinkCommand<'a> {
    workspace: &'a Workspace,
    args: StateLinkArgs,
}

impl<'a> StateLinkCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: StateLinkArgs) -> Self {
        Self { workspace, args }
    }
}

impl Command for StateLinkCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let target = parse_target(&self.args.env)?;
        let dir = match resolve_scope(self.workspace, self.args.project.as_deref(), ui)? {
            Scope::Dir(dir) => dir,
            Scope::Exit(result) => return Ok(result),
        };
        let store = self.workspace.state_store(&dir);
        let mut state = store.read();
        state.set_project_id(&self.args.provider, target, self.args.project_id.clone());
        store.write(&state)?;

        ui.success(&format!(
            "Linked {} {} to {}",
            self.args.provider, target, self.args.project_id
        ));
        Ok(CommandResult::success())
    }
}
