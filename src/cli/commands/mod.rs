//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`fleetenv run`, `fleetenv plan`)
//! - Shared workspace loading through [`Workspace`]
//! - Consistent exit codes

pub mod completions;
pub mod dispatcher;
pub mod env;
pub mod plan;
pub mod run;
pub mod state;

pub use dispatcher::{
    Command, CommandDispatcher, CommandResult, Workspace, EXIT_FAILURE, EXIT_NO_CONFIG,
};
