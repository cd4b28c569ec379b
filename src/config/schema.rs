//! Workspace configuration schema.
//!
//! These structs map to `fleetenv.config.json`. JSON field names are
//! camelCase (`dependsOn`, `envOnly`, `failOnAdd`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default config file name in the workspace root.
pub const CONFIG_FILE_NAME: &str = "fleetenv.config.json";

/// Default local env file when a project does not name one.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Workspace-wide defaults, lowest precedence.
    #[serde(default)]
    pub policy: Policy,

    /// Projects in declaration order.
    pub projects: Vec<ProjectConfig>,
}

impl WorkspaceConfig {
    /// Look up a project by name.
    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.name == name)
    }
}

/// Workspace-wide sync defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_only: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_ignore: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_add: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_remove: Option<bool>,
}

/// One project in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Unique project name.
    pub name: String,

    /// Project directory, relative to the workspace root.
    pub path: String,

    /// Provider adapter id.
    pub provider: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Projects that must run before this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_only: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_ignore: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_add: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_remove: Option<bool>,

    /// Local env file for preview runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file_preview: Option<String>,

    /// Local env file for prod runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file_prod: Option<String>,

    /// Rename/transform document applied after loading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_map_file: Option<String>,
}

impl ProjectConfig {
    /// Local env file name for a deploy target.
    pub fn env_file(&self, target: DeployTarget) -> &str {
        let configured = match target {
            DeployTarget::Prod => self.env_file_prod.as_deref(),
            DeployTarget::Preview => self.env_file_preview.as_deref(),
        };
        configured.unwrap_or(DEFAULT_ENV_FILE)
    }

    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.tags
            .iter()
            .any(|t| tags.iter().any(|wanted| wanted.as_ref() == t))
    }
}

/// Remote environment a run targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployTarget {
    Prod,
    #[default]
    Preview,
}

impl DeployTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            DeployTarget::Prod => "prod",
            DeployTarget::Preview => "preview",
        }
    }

    /// Default file `env pull` writes the remote env to.
    pub fn pull_file(self) -> &'static str {
        match self {
            DeployTarget::Prod => ".env.production.local",
            DeployTarget::Preview => ".env.preview.local",
        }
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" | "production" => Ok(DeployTarget::Prod),
            "preview" => Ok(DeployTarget::Preview),
            other => Err(format!("unknown target '{}' (expected prod or preview)", other)),
        }
    }
}
