//! Run command implementation.
//!
//! The `fleetenv run` command diffs and/or syncs env across the selected
//! projects in dependency order.

use crate::cli::args::{flag_pair, RunArgs};
use crate::config::CliOverrides;
use crate::env::to_patterns;
use crate::error::Result;
use crate::providers::ProviderRegistry;
use crate::runner::{
    annotations, human_lines, json_summary, ndjson_event, ndjson_final, Orchestrator,
    ProjectStatus, RunOptions, RunProgress, Selection,
};
use crate::ui::UserInterface;

use super::dispatcher::{parse_target, Command, CommandResult, Workspace, EXIT_NO_CONFIG};

/// How results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Human,
    Json,
    Ndjson,
}

/// The run command implementation.
pub struct RunCommand<'a> {
    workspace: &'a Workspace,
    args: RunArgs,
}

impl<'a> RunCommand<'a> {
    pub fn new(workspace: &'a Workspace, args: RunArgs) -> Self {
        Self { workspace, args }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Project selection from `--all`, `--projects` and `--tags`.
    pub fn selection(&self) -> Selection {
        if self.args.all {
            return Selection::all();
        }
        Selection {
            names: to_patterns(self.args.projects.as_deref()),
            tags: to_patterns(self.args.tags.as_deref()),
        }
    }

    /// CLI layer for option resolution. A flag given with an empty value
    /// still counts as set.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            only: self.args.only.as_deref().map(|v| to_patterns(Some(v))),
            ignore: self.args.ignore.as_deref().map(|v| to_patterns(Some(v))),
            fail_on_add: flag_pair(self.args.fail_on_add, self.args.no_fail_on_add),
            fail_on_remove: flag_pair(self.args.fail_on_remove, self.args.no_fail_on_remove),
        }
    }

    /// Whether CI behavior applies: `--ci` or a CI environment.
    pub fn is_ci(&self) -> bool {
        self.args.ci || self.workspace.env.is_ci()
    }

    fn build_options(&self) -> Result<RunOptions> {
        Ok(RunOptions {
            target: parse_target(&self.args.env)?,
            diff_env: self.args.diff_env,
            sync_env: self.args.sync_env,
            dry_run: self.args.dry_run,
            strict: self.args.strict,
            ci: self.is_ci(),
            assume_yes: self.args.yes,
        })
    }

    fn format(&self) -> OutputFormat {
        if self.args.json {
            OutputFormat::Json
        } else if self.args.ndjson {
            OutputFormat::Ndjson
        } else {
            OutputFormat::Human
        }
    }
}

impl Command for RunCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) = self.workspace.load_config(ui)? else {
            return Ok(CommandResult::failure(EXIT_NO_CONFIG));
        };

        let options = self.build_options()?;
        let format = self.format();
        let ci = options.ci;
        let ci_strict = self.args.ci;
        let registry = ProviderRegistry::with_builtins();
        let orchestrator =
            Orchestrator::new(&config, &self.workspace.root, &registry, &self.workspace.env);

        if format == OutputFormat::Human {
            ui.show_header(&format!("fleetenv run ({})", options.target));
            if options.dry_run {
                ui.message("Dry run: nothing will be linked or pushed");
            }
        }

        let mut emit_error = None;
        let report = orchestrator.run_with_progress(
            &self.selection(),
            &self.overrides(),
            &options,
            ui,
            |progress, ui| {
                let RunProgress::ProjectFinished { outcome } = progress else {
                    return;
                };
                // Annotations would break machine-readable stdout.
                if ci && format == OutputFormat::Human {
                    for line in annotations(outcome, ci_strict) {
                        ui.message(&line);
                    }
                }
                match format {
                    OutputFormat::Ndjson => match ndjson_event(outcome) {
                        Ok(line) => ui.message(&line),
                        Err(e) => emit_error = Some(e),
                    },
                    OutputFormat::Human => {
                        let mut lines = human_lines(outcome).into_iter();
                        if let Some(first) = lines.next() {
                            match outcome.status {
                                ProjectStatus::Ok => ui.success(&first),
                                ProjectStatus::Failed => ui.error(&first),
                                ProjectStatus::Skipped => ui.warning(&first),
                            }
                        }
                        if ui.output_mode().shows_details() || outcome.is_failed() {
                            for line in lines {
                                ui.message(&line);
                            }
                        }
                    }
                    OutputFormat::Json => {}
                }
            },
        )?;
        if let Some(e) = emit_error {
            return Err(e);
        }

        match format {
            OutputFormat::Json => ui.message(&json_summary(&report)?),
            OutputFormat::Ndjson => ui.message(&ndjson_final(&report)?),
            OutputFormat::Human => {
                let total = report.results.len();
                let failed = report.failed_count();
                if report.ok {
                    ui.success(&format!("{} project(s) ok", total));
                } else {
                    ui.error(&format!("{} of {} project(s) failed", failed, total));
                }
            }
        }

        Ok(CommandResult::from_ok(report.ok))
    }
}
