//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`Workspace`] for what every command shares: root, config location,
//!   and the environment context
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, EnvCommands, RunArgs, StateCommands};
use crate::config::{load_config, DeployTarget, ProjectConfig, WorkspaceConfig};
use crate::env::EnvContext;
use crate::error::{FleetError, Result};
use crate::state::{PlatformInfo, StateEnv, StateStore};
use crate::ui::UserInterface;

/// Exit code for run failures and policy violations.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when the workspace config is missing.
pub const EXIT_NO_CONFIG: i32 = 2;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Success or [`EXIT_FAILURE`].
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            Self::success()
        } else {
            Self::failure(EXIT_FAILURE)
        }
    }
}

/// Shared command inputs.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config_override: Option<PathBuf>,
    pub env: EnvContext,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, env: EnvContext) -> Self {
        Self {
            root: root.into(),
            config_override: None,
            env,
        }
    }

    pub fn with_config(mut self, config: Option<PathBuf>) -> Self {
        self.config_override = config;
        self
    }

    /// Load the workspace config.
    ///
    /// A missing config is reported through `ui` and yields `Ok(None)`, so
    /// the caller can exit with [`EXIT_NO_CONFIG`]. Other config errors are
    /// returned.
    pub fn load_config(&self, ui: &mut dyn UserInterface) -> Result<Option<WorkspaceConfig>> {
        match load_config(&self.root, self.config_override.as_deref()) {
            Ok(config) => Ok(Some(config)),
            Err(FleetError::ConfigNotFound { path }) => {
                ui.error(&format!("No workspace config found at {}", path.display()));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// State store for a project directory on this host.
    pub fn state_store(&self, dir: &Path) -> StateStore {
        StateStore::new(&PlatformInfo::detect(), &StateEnv::from_context(&self.env), dir)
    }
}

/// Look up a project by name, reporting unknown names through `ui`.
pub fn find_project<'a>(
    config: &'a WorkspaceConfig,
    name: &str,
    ui: &mut dyn UserInterface,
) -> Option<&'a ProjectConfig> {
    let project = config.project(name);
    if project.is_none() {
        ui.error(&format!("Unknown project: {}", name));
    }
    project
}

/// Parse a `--env` value.
pub fn parse_target(value: &str) -> Result<DeployTarget> {
    value
        .parse()
        .map_err(|message: String| FleetError::ConfigValidationError { message })
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    workspace: Workspace,
}

impl CommandDispatcher {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace.root
    }

    /// Dispatch and execute a command.
    ///
    /// With no subcommand, runs a diff over every project.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ws = &self.workspace;
        match &cli.command {
            Some(Commands::Run(args)) => super::run::RunCommand::new(ws, args.clone()).execute(ui),
            Some(Commands::Plan(args)) => {
                super::plan::PlanCommand::new(ws, args.clone()).execute(ui)
            }
            Some(Commands::Env(args)) => match &args.command {
                EnvCommands::Print(args) => {
                    super::env::EnvPrintCommand::new(ws, args.clone()).execute(ui)
                }
                EnvCommands::Pull(args) => {
                    super::env::EnvPullCommand::new(ws, args.clone()).execute(ui)
                }
                EnvCommands::Validate(args) => {
                    super::env::EnvValidateCommand::new(ws, args.clone()).execute(ui)
                }
            },
            Some(Commands::State(args)) => match &args.command {
                StateCommands::Path(args) => {
                    super::state::StatePathCommand::new(ws, args.clone()).execute(ui)
                }
                StateCommands::Show(args) => {
                    super::state::StateShowCommand::new(ws, args.clone()).execute(ui)
                }
                StateCommands::Link(args) => {
                    super::state::StateLinkCommand::new(ws, args.clone()).execute(ui)
                }
            },
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
            None => super::run::RunCommand::new(ws, RunArgs::default()).execute(ui),
        }
    }
}
