//! Workspace configuration loading, validation, and option resolution.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Structural and reference validation in [`validator`]
//! - Per-project option precedence in [`policy`]
//!
//! # Example
//!
//! ```
//! use fleetenv::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(
//!     temp.path().join("fleetenv.config.json"),
//!     r#"{"projects": [{"name": "web", "path": "apps/web", "provider": "virtual"}]}"#,
//! ).unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! assert_eq!(config.projects[0].name, "web");
//! ```

pub mod loader;
pub mod policy;
pub mod schema;
pub mod validator;

pub use loader::{config_path, load_config, load_config_file, parse_config};
pub use policy::{
    resolve_effective_options, CliOverrides, EffectiveOptions, OptionSource, OptionSources,
};
pub use schema::{
    DeployTarget, Policy, ProjectConfig, WorkspaceConfig, CONFIG_FILE_NAME, DEFAULT_ENV_FILE,
};
pub use validator::{validate_references, validate_structure, ValidationError};
