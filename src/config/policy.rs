//! Effective sync options per project.
//!
//! Each field resolves independently using the priority chain:
//! 1. CLI flag, when explicitly supplied (an empty list counts)
//! 2. Project field
//! 3. Workspace policy field
//! 4. Built-in default (empty lists, `false`)
//!
//! A field set at a higher layer replaces the lower value whole; lists are
//! never merged element-wise.

use serde::Serialize;

use crate::config::schema::{Policy, ProjectConfig};
use crate::env::KeyFilter;

/// Which layer a resolved field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSource {
    Cli,
    Project,
    Policy,
    Default,
}

impl std::fmt::Display for OptionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "command line"),
            Self::Project => write!(f, "project config"),
            Self::Policy => write!(f, "workspace policy"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Options supplied on the command line. `None` means the flag was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub only: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub fail_on_add: Option<bool>,
    pub fail_on_remove: Option<bool>,
}

/// Where each effective field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSources {
    pub only: OptionSource,
    pub ignore: OptionSource,
    pub fail_on_add: OptionSource,
    pub fail_on_remove: OptionSource,
}

/// Resolved sync options for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveOptions {
    pub only: Vec<String>,
    pub ignore: Vec<String>,
    pub fail_on_add: bool,
    pub fail_on_remove: bool,
    #[serde(skip)]
    pub sources: OptionSources,
}

impl EffectiveOptions {
    /// Compiled key filter for these options.
    pub fn key_filter(&self) -> KeyFilter {
        KeyFilter::new(&self.only, &self.ignore)
    }

    /// True when either fail-on flag is set.
    pub fn has_fail_on(&self) -> bool {
        self.fail_on_add || self.fail_on_remove
    }
}

fn pick<T: Clone>(cli: &Option<T>, project: &Option<T>, policy: &Option<T>) -> Option<(T, OptionSource)> {
    if let Some(v) = cli {
        return Some((v.clone(), OptionSource::Cli));
    }
    if let Some(v) = project {
        return Some((v.clone(), OptionSource::Project));
    }
    policy.as_ref().map(|v| (v.clone(), OptionSource::Policy))
}

fn resolve_field<T: Clone + Default>(
    cli: &Option<T>,
    project: &Option<T>,
    policy: &Option<T>,
) -> (T, OptionSource) {
    pick(cli, project, policy).unwrap_or((T::default(), OptionSource::Default))
}

/// Resolve effective options for a project.
///
/// # Example
///
/// ```
/// use fleetenv::config::{resolve_effective_options, CliOverrides, OptionSource, Policy, ProjectConfig};
///
/// let policy = Policy { fail_on_remove: Some(true), ..Default::default() };
/// let project = ProjectConfig { fail_on_add: Some(true), ..Default::default() };
/// let cli = CliOverrides { only: Some(vec!["NEXT_PUBLIC_*".into()]), ..Default::default() };
///
/// let effective = resolve_effective_options(&policy, &project, &cli);
/// assert_eq!(effective.only, vec!["NEXT_PUBLIC_*"]);
/// assert!(effective.fail_on_add);
/// assert!(effective.fail_on_remove);
/// assert_eq!(effective.sources.fail_on_remove, OptionSource::Policy);
/// ```
pub fn resolve_effective_options(
    policy: &Policy,
    project: &ProjectConfig,
    cli: &CliOverrides,
) -> EffectiveOptions {
    let (only, only_src) = resolve_field(&cli.only, &project.env_only, &policy.env_only);
    let (ignore, ignore_src) = resolve_field(&cli.ignore, &project.env_ignore, &policy.env_ignore);
    let (fail_on_add, add_src) =
        resolve_field(&cli.fail_on_add, &project.fail_on_add, &policy.fail_on_add);
    let (fail_on_remove, remove_src) = resolve_field(
        &cli.fail_on_remove,
        &project.fail_on_remove,
        &policy.fail_on_remove,
    );

    tracing::debug!(
        "Options for {}: only from {}, ignore from {}, failOnAdd from {}, failOnRemove from {}",
        project.name,
        only_src,
        ignore_src,
        add_src,
        remove_src
    );

    EffectiveOptions {
        only,
        ignore,
        fail_on_add,
        fail_on_remove,
        sources: OptionSources {
            only: only_src,
            ignore: ignore_src,
            fail_on_add: add_src,
            fail_on_remove: remove_src,
        },
    }
}
