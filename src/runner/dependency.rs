//! Dependency graph and layered execution planning for projects.
//!
//! Planning happens in three steps:
//! 1. The selection filter picks projects by name, else by tag.
//! 2. A graph is built over the survivors only. A `dependsOn` edge to a
//!    project that was filtered out counts as satisfied.
//! 3. Layers are peeled off Kahn-style: every project with no remaining
//!    unsatisfied dependency, in declaration order, forms the next layer.
//!
//! Nothing here iterates a hash map, so output is stable for identical input.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::config::ProjectConfig;
use crate::error::{FleetError, Result};

/// Which projects a run should cover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Explicit project names. Takes precedence over `tags`.
    pub names: Vec<String>,
    pub tags: Vec<String>,
}

impl Selection {
    /// Select every project.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            tags: Vec::new(),
        }
    }

    pub fn tags<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: Vec::new(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Apply the filter, keeping declaration order.
    ///
    /// Unknown names simply select nothing.
    pub fn apply<'a>(&self, projects: &'a [ProjectConfig]) -> Vec<&'a ProjectConfig> {
        if !self.names.is_empty() {
            projects
                .iter()
                .filter(|p| self.names.iter().any(|n| n == &p.name))
                .collect()
        } else if !self.tags.is_empty() {
            projects.iter().filter(|p| p.has_any_tag(&self.tags)).collect()
        } else {
            projects.iter().collect()
        }
    }
}

/// Dependency relationships between a set of projects.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Project names in declaration order.
    nodes: Vec<String>,
    /// Map of project name to its direct dependencies inside the graph.
    dependencies: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a graph over the given projects.
    ///
    /// Edges whose target is not in `projects` are dropped.
    pub fn from_projects<'a>(projects: impl IntoIterator<Item = &'a ProjectConfig>) -> Self {
        let projects: Vec<&ProjectConfig> = projects.into_iter().collect();
        let present: HashSet<&str> = projects.iter().map(|p| p.name.as_str()).collect();

        let nodes = projects.iter().map(|p| p.name.clone()).collect();
        let dependencies = projects
            .iter()
            .map(|p| {
                let mut deps: Vec<String> = Vec::new();
                for dep in &p.depends_on {
                    if present.contains(dep.as_str()) && !deps.contains(dep) {
                        deps.push(dep.clone());
                    }
                }
                (p.name.clone(), deps)
            })
            .collect();

        Self {
            nodes,
            dependencies,
        }
    }

    /// Get the direct dependencies of a project.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a cycle in the graph, returning the path if one exists.
    ///
    /// The path starts and ends with the same project.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node);

            for dep in graph.dependencies_of(node) {
                match state.get(dep.as_str()) {
                    Some(State::Visiting) => {
                        let start = path.iter().position(|s| *s == dep.as_str()).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|s| s.to_string()).collect();
                        cycle.push(dep.clone());
                        return Some(cycle);
                    }
                    Some(State::Unvisited) => {
                        if let Some(cycle) = dfs(dep, graph, state, path) {
                            return Some(cycle);
                        }
                    }
                    Some(State::Visited) | None => {}
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        let mut state: HashMap<&str, State> = self
            .nodes
            .iter()
            .map(|n| (n.as_str(), State::Unvisited))
            .collect();
        let mut path = Vec::new();

        for node in &self.nodes {
            if state.get(node.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(node, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Group projects into layers; each layer depends only on earlier ones.
    ///
    /// # Errors
    ///
    /// `CircularDependency` when some projects can never become ready.
    pub fn layers(&self) -> Result<Vec<Vec<String>>> {
        let mut remaining: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| (n.as_str(), self.dependencies_of(n).len()))
            .collect();
        let mut done: HashSet<&str> = HashSet::new();
        let mut layers: Vec<Vec<String>> = Vec::new();

        while done.len() < self.nodes.len() {
            let layer: Vec<&str> = self
                .nodes
                .iter()
                .map(String::as_str)
                .filter(|n| !done.contains(n) && remaining.get(n) == Some(&0))
                .collect();

            if layer.is_empty() {
                let cycle = self.find_cycle().unwrap_or_else(|| {
                    self.nodes
                        .iter()
                        .filter(|n| !done.contains(n.as_str()))
                        .cloned()
                        .collect()
                });
                return Err(FleetError::CircularDependency {
                    cycle: cycle.join(" -> "),
                });
            }

            done.extend(layer.iter().copied());
            for node in &self.nodes {
                let satisfied = self
                    .dependencies_of(node)
                    .iter()
                    .filter(|d| layer.contains(&d.as_str()))
                    .count();
                if let Some(count) = remaining.get_mut(node.as_str()) {
                    *count -= satisfied;
                }
            }

            layers.push(layer.into_iter().map(String::from).collect());
        }

        Ok(layers)
    }
}

/// Ordered execution layers for a selection.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan<'a> {
    pub layers: Vec<Vec<&'a ProjectConfig>>,
}

impl<'a> ExecutionPlan<'a> {
    /// Project names in execution order.
    pub fn order(&self) -> Vec<&'a str> {
        self.layers
            .iter()
            .flatten()
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Project names per layer.
    pub fn layer_names(&self) -> Vec<Vec<&'a str>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(|p| p.name.as_str()).collect())
            .collect()
    }

    pub fn project_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }
}

/// Select projects and order them into dependency layers.
///
/// # Errors
///
/// - `NoMatchingProjects` when the selection keeps nothing
/// - `CircularDependency` when the selected projects form a cycle
///
/// # Example
///
/// ```
/// use fleetenv::config::ProjectConfig;
/// use fleetenv::runner::{plan, Selection};
///
/// let project = |name: &str, deps: &[&str], tags: &[&str]| ProjectConfig {
///     name: name.into(),
///     depends_on: deps.iter().map(|d| d.to_string()).collect(),
///     tags: tags.iter().map(|t| t.to_string()).collect(),
///     ..Default::default()
/// };
/// let projects = vec![
///     project("a", &[], &[]),
///     project("b", &["a"], &["web"]),
///     project("c", &["b"], &["web"]),
/// ];
///
/// let plan = plan(&projects, &Selection::tags(["web"])).unwrap();
/// assert_eq!(plan.order(), vec!["b", "c"]);
/// ```
pub fn plan<'a>(projects: &'a [ProjectConfig], selection: &Selection) -> Result<ExecutionPlan<'a>> {
    let selected = selection.apply(projects);
    if selected.is_empty() {
        return Err(FleetError::NoMatchingProjects);
    }

    let graph = DependencyGraph::from_projects(selected.iter().copied());
    let by_name: HashMap<&str, &'a ProjectConfig> =
        selected.iter().map(|p| (p.name.as_str(), *p)).collect();

    let layers: Vec<Vec<&'a ProjectConfig>> = graph
        .layers()?
        .into_iter()
        .map(|layer| {
            layer
                .iter()
                .filter_map(|name| by_name.get(name.as_str()).copied())
                .collect()
        })
        .collect();

    tracing::debug!(
        "Planned {} project(s) in {} layer(s)",
        selected.len(),
        layers.len()
    );

    Ok(ExecutionPlan { layers })
}
