//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.
//!
//! List-valued options (`--projects`, `--tags`, `--only`, `--ignore`) are
//! kept as raw comma-separated strings so that a flag given with an empty
//! value can be told apart from an absent flag.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Fleetenv - environment sync across a multi-project workspace.
#[derive(Debug, Parser)]
#[command(name = "fleetenv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Path to the workspace config, relative to the root
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Diff or sync env across the selected projects (default)
    Run(RunArgs),

    /// Show the dependency-ordered execution plan
    Plan(PlanArgs),

    /// Inspect a project's local env
    Env(EnvArgs),

    /// Inspect or seed provider linkage state
    State(StateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Deploy target: prod or preview
    #[arg(long, value_name = "TARGET", default_value = "preview")]
    pub env: String,

    /// Only these projects (comma-separated names)
    #[arg(long, value_name = "NAMES")]
    pub projects: Option<String>,

    /// Only projects carrying one of these tags (comma-separated)
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Select every project, ignoring --projects and --tags
    #[arg(long)]
    pub all: bool,

    /// Push local env to each project's provider
    #[arg(long)]
    pub sync_env: bool,

    /// Compare local env with each project's remote env
    #[arg(long)]
    pub diff_env: bool,

    /// Show what a sync would push without linking or pushing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// CI mode: no prompts, GitHub annotations, drift is an error
    #[arg(long)]
    pub ci: bool,

    /// Stop after the first layer with a failed project
    #[arg(long)]
    pub strict: bool,

    /// Print one JSON summary
    #[arg(long, conflicts_with = "ndjson")]
    pub json: bool,

    /// Print one JSON event per project and a final summary line
    #[arg(long)]
    pub ndjson: bool,

    /// Only sync keys matching these patterns (comma-separated, `*` suffix)
    #[arg(long, value_name = "PATTERNS")]
    pub only: Option<String>,

    /// Never sync keys matching these patterns (comma-separated, `*` suffix)
    #[arg(long, value_name = "PATTERNS")]
    pub ignore: Option<String>,

    /// Fail when keys exist only locally
    #[arg(long, overrides_with = "no_fail_on_add")]
    pub fail_on_add: bool,

    /// Do not fail when keys exist only locally
    #[arg(long, overrides_with = "fail_on_add")]
    pub no_fail_on_add: bool,

    /// Fail when keys exist only remotely
    #[arg(long, overrides_with = "no_fail_on_remove")]
    pub fail_on_remove: bool,

    /// Do not fail when keys exist only remotely
    #[arg(long, overrides_with = "fail_on_remove")]
    pub no_fail_on_remove: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            env: "preview".to_string(),
            projects: None,
            tags: None,
            all: false,
            sync_env: false,
            diff_env: false,
            dry_run: false,
            yes: false,
            ci: false,
            strict: false,
            json: false,
            ndjson: false,
            only: None,
            ignore: None,
            fail_on_add: false,
            no_fail_on_add: false,
            fail_on_remove: false,
            no_fail_on_remove: false,
        }
    }
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    /// Only these projects (comma-separated names)
    #[arg(long, value_name = "NAMES")]
    pub projects: Option<String>,

    /// Only projects carrying one of these tags (comma-separated)
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `env` command.
#[derive(Debug, Clone, clap::Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommands,
}

/// `env` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum EnvCommands {
    /// Print the loaded and filtered env of a project, values masked
    Print(EnvPrintArgs),

    /// Write a project's remote env to a local file
    Pull(EnvPullArgs),

    /// Check a project's env against required-key schemas
    Validate(EnvValidateArgs),
}

/// Arguments for `env print`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvPrintArgs {
    /// Project name
    #[arg(long)]
    pub project: String,

    /// Deploy target: prod or preview
    #[arg(long, value_name = "TARGET", default_value = "preview")]
    pub env: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `env pull`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvPullArgs {
    /// Project name
    #[arg(long)]
    pub project: String,

    /// Deploy target: prod or preview
    #[arg(long, value_name = "TARGET", default_value = "preview")]
    pub env: String,

    /// Output file, relative to the project directory (default: .env.preview.local or .env.production.local)
    #[arg(long, value_name = "FILE")]
    pub out: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `env validate`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EnvValidateArgs {
    /// Project name
    #[arg(long)]
    pub project: String,

    /// Deploy target: prod or preview
    #[arg(long, value_name = "TARGET", default_value = "preview")]
    pub env: String,

    /// Schemas: comma-separated `builtin:<name>` entries or JSON file paths
    #[arg(long)]
    pub schema: String,

    /// Schema type: keys or rules
    #[arg(long, value_name = "TYPE", default_value = "keys")]
    pub schema_type: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `state` command.
#[derive(Debug, Clone, clap::Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommands,
}

/// `state` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum StateCommands {
    /// Print where state is written and read from
    Path(StateScopeArgs),

    /// Print the persisted state
    Show(StateScopeArgs),

    /// Record a linked remote project id
    Link(StateLinkArgs),
}

/// Selects whose state to inspect: a project directory or the workspace root.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StateScopeArgs {
    /// Project name (defaults to the workspace root)
    #[arg(long)]
    pub project: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `state link`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StateLinkArgs {
    /// Project name (defaults to the workspace root)
    #[arg(long)]
    pub project: Option<String>,

    /// Provider id
    #[arg(long)]
    pub provider: String,

    /// Deploy target: prod or preview
    #[arg(long, value_name = "TARGET", default_value = "preview")]
    pub env: String,

    /// Remote project id
    #[arg(long)]
    pub project_id: String,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Resolve a `--flag` / `--no-flag` pair into an explicit override.
pub fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}
