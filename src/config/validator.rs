//! Configuration validation rules.
//!
//! Structural checks run on the raw JSON document so that messages can name
//! the offending field (`projects[2].dependsOn must be an array of strings`).
//! Reference checks run on the typed config:
//! - project names must be unique
//! - `dependsOn` must reference declared projects
//! - the dependency graph must be acyclic

use serde_json::Value;
use std::collections::HashSet;

use crate::config::schema::WorkspaceConfig;
use crate::error::{FleetError, Result};
use crate::runner::dependency::DependencyGraph;

/// A structural problem in the config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field path, e.g. `projects[0].name`.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

fn is_string_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

fn is_non_empty_string(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

/// Check the shape of a raw config document, collecting every problem.
pub fn validate_structure(doc: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(projects) = doc.get("projects").and_then(Value::as_array) else {
        errors.push(ValidationError {
            field: "projects".to_string(),
            message: "must be an array".to_string(),
        });
        return errors;
    };

    if let Some(policy) = doc.get("policy") {
        if policy.is_object() {
            check_options(policy, "policy", &mut errors);
        } else {
            errors.push(ValidationError {
                field: "policy".to_string(),
                message: "must be an object".to_string(),
            });
        }
    }

    for (i, project) in projects.iter().enumerate() {
        let prefix = format!("projects[{}]", i);

        if !project.is_object() {
            errors.push(ValidationError {
                field: prefix,
                message: "must be an object".to_string(),
            });
            continue;
        }

        for field in ["name", "path", "provider"] {
            if !is_non_empty_string(project.get(field)) {
                errors.push(ValidationError {
                    field: format!("{}.{}", prefix, field),
                    message: "must be a non-empty string".to_string(),
                });
            }
        }

        for field in ["tags", "dependsOn"] {
            if project.get(field).is_some_and(|v| !is_string_array(v)) {
                errors.push(ValidationError {
                    field: format!("{}.{}", prefix, field),
                    message: "must be an array of strings".to_string(),
                });
            }
        }

        for field in ["envFilePreview", "envFileProd", "envMapFile"] {
            if project.get(field).is_some_and(|v| !v.is_string()) {
                errors.push(ValidationError {
                    field: format!("{}.{}", prefix, field),
                    message: "must be a string".to_string(),
                });
            }
        }

        check_options(project, &prefix, &mut errors);
    }

    errors
}

/// Checks shared by `policy` and each project.
fn check_options(obj: &Value, prefix: &str, errors: &mut Vec<ValidationError>) {
    for field in ["envOnly", "envIgnore"] {
        if obj.get(field).is_some_and(|v| !is_string_array(v)) {
            errors.push(ValidationError {
                field: format!("{}.{}", prefix, field),
                message: "must be an array of strings".to_string(),
            });
        }
    }
    for field in ["failOnAdd", "failOnRemove"] {
        if obj.get(field).is_some_and(|v| !v.is_boolean()) {
            errors.push(ValidationError {
                field: format!("{}.{}", prefix, field),
                message: "must be a boolean".to_string(),
            });
        }
    }
}

/// Check cross-project references.
///
/// # Errors
///
/// - `ConfigValidationError` for duplicate project names
/// - `UnknownDependency` for a `dependsOn` entry naming no project
/// - `CircularDependency` when projects depend on each other in a loop
pub fn validate_references(config: &WorkspaceConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, project) in config.projects.iter().enumerate() {
        if !seen.insert(project.name.as_str()) {
            return Err(FleetError::ConfigValidationError {
                message: format!(
                    "projects[{}].name duplicates project '{}'",
                    i, project.name
                ),
            });
        }
    }

    for project in &config.projects {
        for dep in &project.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(FleetError::UnknownDependency {
                    project: project.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let graph = DependencyGraph::from_projects(&config.projects);
    if let Some(cycle) = graph.find_cycle() {
        return Err(FleetError::CircularDependency {
            cycle: cycle.join(" -> "),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProjectConfig;
    use serde_json::json;

    fn project(name: &str, deps: &[&str]) -> ProjectConfig {
        ProjectConfig {
            name: name.into(),
            path: name.into(),
            provider: "virtual".into(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_document_has_no_errors() {
        let doc = json!({
            "policy": {"envOnly": ["A_*"], "failOnAdd": false},
            "projects": [
                {"name": "a", "path": "a", "provider": "virtual", "tags": ["x"]}
            ]
        });
        assert!(validate_structure(&doc).is_empty());
    }

    #[test]
    fn missing_projects_is_reported() {
        let errors = validate_structure(&json!({"policy": {}}));
        assert_eq!(errors[0].to_string(), "projects must be an array");
    }

    #[test]
    fn names_offending_project_fields() {
        let doc = json!({
            "projects": [
                {"name": "a", "path": "a", "provider": "virtual"},
                {"name": " ", "path": "b", "provider": "virtual", "dependsOn": ["a", 3]}
            ]
        });

        let errors = validate_structure(&doc);
        let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();

        assert!(rendered.contains(&"projects[1].name must be a non-empty string".to_string()));
        assert!(rendered.contains(&"projects[1].dependsOn must be an array of strings".to_string()));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn rejects_wrongly_typed_options() {
        let doc = json!({
            "policy": {"failOnRemove": "yes"},
            "projects": [
                {"name": "a", "path": "a", "provider": "virtual", "envOnly": "A_*"}
            ]
        });

        let fields: Vec<String> = validate_structure(&doc)
            .into_iter()
            .map(|e| e.field)
            .collect();

        assert_eq!(fields, vec!["policy.failOnRemove", "projects[0].envOnly"]);
    }

    #[test]
    fn references_accept_valid_graph() {
        let config = WorkspaceConfig {
            projects: vec![project("a", &[]), project("b", &["a"])],
            ..Default::default()
        };
        assert!(validate_references(&config).is_ok());
    }

    #[test]
    fn unknown_dependency_is_error() {
        let config = WorkspaceConfig {
            projects: vec![project("web", &["api"])],
            ..Default::default()
        };
        let err = validate_references(&config).unwrap_err();
        assert!(matches!(
            err,
            FleetError::UnknownDependency { ref project, ref dependency }
                if project == "web" && dependency == "api"
        ));
    }

    #[test]
    fn duplicate_names_are_error() {
        let config = WorkspaceConfig {
            projects: vec![project("a", &[]), project("a", &[])],
            ..Default::default()
        };
        let err = validate_references(&config).unwrap_err();
        assert!(err.to_string().contains("projects[1].name"));
    }

    #[test]
    fn cycles_are_error() {
        let config = WorkspaceConfig {
            projects: vec![project("x", &["y"]), project("y", &["x"])],
            ..Default::default()
        };
        let err = validate_references(&config).unwrap_err();
        assert!(matches!(err, FleetError::CircularDependency { .. }));
    }
}
