//! Plan command implementation.
//!
//! The `fleetenv plan` command prints the layered execution order for a
//! selection without touching env files or providers.

use serde::Serialize;

use crate::cli::args::PlanArgs;
use crate::env::to_patterns;
use crate::error::Result;
use crate::runner::{plan, Selection};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, Workspace, EXIT_NO_CONFIG};

#[derive(Serialize)]
struct PlanOutput<'a> {
    layers: Vec<Vec<&'a str>>,
    order: Vec<&'a str>,
}

/// The plan command implementation.
pub struct PlanCommand<'a> {
    workspace: &'a Workspace,
    args: PlanArgs,
}

impl<'a> PlanCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: PlanArgs) -> Self {
        Self { workspace, args }
    }

    fn selection(&self) -> Selection {
        Selection {
            names: to_patterns(self.args.projects.as_deref()),
            tags: to_patterns(self.args.tags.as_deref()),
        }
    }
}

impl Command for PlanCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) = self.workspace.load_config(ui)? else {
            return Ok(CommandResult::failure(EXIT_NO_CONFIG));
        };

        let plan = plan(&config.projects, &self.selection())?;

        if self.args.json {
            let output = PlanOutput {
                layers: plan.layer_names(),
                order: plan.order(),
            };
            ui.message(&serde_json::to_string_pretty(&output).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("Execution plan ({} projects)", plan.project_count()));
        for (index, layer) in plan.layers.iter().enumerate() {
            let names: Vec<String> = layer
                .iter()
                .map(|p| format!("{} [{}]", p.name, p.provider))
                .collect();
            ui.message(&format!("  {}. {}", index + 1, names.join(", ")));
        }

        Ok(CommandResult::success())
    }
}
