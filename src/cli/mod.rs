//! Command-line interface for fleetenv.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, EnvArgs, EnvCommands, EnvPrintArgs, EnvPullArgs,
    EnvValidateArgs, PlanArgs, RunArgs, StateArgs, StateCommands, StateLinkArgs, StateScopeArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult, Workspace};
