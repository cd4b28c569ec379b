//! fleetenv - environment sync across a multi-project workspace.
//!
//! A workspace declares its projects in `fleetenv.config.json`. fleetenv
//! orders them by their `dependsOn` edges, resolves per-project sync options
//! from CLI flags, project settings and workspace policy, loads each
//! project's `.env` files, and diffs or pushes the result through a
//! provider adapter.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Workspace config loading, validation, and option precedence
//! - [`env`] - Env file loading, key patterns, diffing, mapping, validation
//! - [`error`] - Error types and result aliases
//! - [`providers`] - Provider adapters and their registry
//! - [`runner`] - Execution planning and orchestration
//! - [`state`] - Persisted provider linkage
//! - [`ui`] - Terminal output and confirmation prompts
//!
//! # Example
//!
//! ```
//! use fleetenv::env::{diff_key_values, EnvContext, parse_env_str};
//!
//! let ctx = EnvContext::empty();
//! let local = parse_env_str("A=  foo  \nB=$A-suf\nEMPTY=   \n", &ctx);
//! let remote = parse_env_str("A=foo\n", &ctx);
//!
//! let diff = diff_key_values(&local, &remote);
//! assert_eq!(diff.added, vec!["B"]);
//! assert!(diff.removed.is_empty());
//! ```

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod providers;
pub mod runner;
pub mod state;
pub mod ui;

pub use error::{FleetError, Result};
