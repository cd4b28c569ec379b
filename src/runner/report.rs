//! Rendering of run outcomes: human lines, CI annotations, NDJSON events.

use serde::Serialize;

use crate::env::mask;
use crate::error::Result;

use super::orchestrator::{ProjectOutcome, ProjectStatus, RunReport};

/// Annotation severity understood by GitHub Actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLevel {
    Error,
    Warning,
}

impl AnnotationLevel {
    fn as_str(self) -> &'static str {
        match self {
            AnnotationLevel::Error => "error",
            AnnotationLevel::Warning => "warning",
        }
    }
}

fn status_label(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Ok => "ok",
        ProjectStatus::Failed => "failed",
        ProjectStatus::Skipped => "skipped",
    }
}

/// Human-readable lines for one project. Values are always masked.
pub fn human_lines(outcome: &ProjectOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [{}] {}",
        outcome.project,
        outcome.provider,
        status_label(outcome.status)
    )];

    if let Some(diff) = &outcome.diff {
        if diff.is_empty() {
            lines.push("  in sync".to_string());
        }
        for key in &diff.added {
            lines.push(format!("  + {} (only local)", key));
        }
        for key in &diff.removed {
            lines.push(format!("  - {} (only remote)", key));
        }
        for change in &diff.changed {
            lines.push(format!(
                "  ~ {}: {} -> {}",
                change.key,
                mask(&change.remote),
                mask(&change.local)
            ));
        }
    }

    for item in &outcome.would_set {
        lines.push(format!("  would set {}={}", item.key, item.value));
    }

    if let Some(sync) = &outcome.sync {
        lines.push(format!(
            "  set {}, unchanged {}",
            sync.set.len(),
            sync.skipped.len()
        ));
    }

    for reason in &outcome.reasons {
        lines.push(format!("  ! {}", reason));
    }

    lines
}

/// GitHub-style annotations for a project's diff.
///
/// Local-only keys are errors when `failOnAdd` is set, remote-only keys when
/// `failOnRemove` is set; `ci_strict` makes every drift an error.
pub fn annotations(outcome: &ProjectOutcome, ci_strict: bool) -> Vec<String> {
    let Some(diff) = &outcome.diff else {
        return Vec::new();
    };
    let (fail_on_add, fail_on_remove) = outcome
        .options
        .as_ref()
        .map(|o| (o.fail_on_add, o.fail_on_remove))
        .unwrap_or_default();

    let level = |flag: bool| {
        if flag || ci_strict {
            AnnotationLevel::Error
        } else {
            AnnotationLevel::Warning
        }
    };
    let line = |level: AnnotationLevel, label: &str, key: &str| {
        format!("::{} ::{}: {} ({})", level.as_str(), label, key, outcome.project)
    };

    let mut out = Vec::with_capacity(diff.len());
    for key in &diff.added {
        out.push(line(level(fail_on_add), "Only local", key));
    }
    for key in &diff.removed {
        out.push(line(level(fail_on_remove), "Only remote", key));
    }
    for key in diff.changed_keys() {
        out.push(line(level(false), "Changed", key));
    }
    out
}

#[derive(Serialize)]
struct ProjectEvent<'a> {
    event: &'static str,
    #[serde(flatten)]
    outcome: &'a ProjectOutcome,
}

#[derive(Serialize)]
struct FinalEvent<'a> {
    ok: bool,
    target: &'a str,
    total: usize,
    failed: usize,
    #[serde(rename = "final")]
    is_final: bool,
}

/// One NDJSON line for a finished project.
pub fn ndjson_event(outcome: &ProjectOutcome) -> Result<String> {
    let event = ProjectEvent {
        event: "project",
        outcome,
    };
    Ok(serde_json::to_string(&event).map_err(anyhow::Error::from)?)
}

/// The closing NDJSON line of a run.
pub fn ndjson_final(report: &RunReport) -> Result<String> {
    let event = FinalEvent {
        ok: report.ok,
        target: report.target.as_str(),
        total: report.results.len(),
        failed: report.failed_count(),
        is_final: true,
    };
    Ok(serde_json::to_string(&event).map_err(anyhow::Error::from)?)
}

/// The pretty JSON summary of a run.
pub fn json_summary(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report).map_err(anyhow::Error::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_effective_options, CliOverrides, DeployTarget, Policy, ProjectConfig};
    use crate::env::{diff_key_values, EnvMap};
    use crate::providers::SyncOutcome;

    fn map(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn outcome_with_diff(fail_on_add: bool) -> ProjectOutcome {
        let project = ProjectConfig {
            name: "web".into(),
            provider: "virtual".into(),
            fail_on_add: Some(fail_on_add),
            ..Default::default()
        };
        let options = resolve_effective_options(&Policy::default(), &project, &CliOverrides::default());
        let diff = diff_key_values(
            &map(&[("A", "1"), ("B", "local-value")]),
            &map(&[("B", "remote-value"), ("D", "4")]),
        );
        ProjectOutcome {
            project: "web".into(),
            provider: "virtual".into(),
            status: ProjectStatus::Ok,
            project_id: None,
            options: Some(options),
            diff: Some(diff),
            sync: None,
            would_set: Vec::new(),
            reasons: Vec::new(),
        }
    }

    #[test]
    fn human_lines_mask_changed_values() {
        let lines = human_lines(&outcome_with_diff(false));
        assert_eq!(lines[0], "web [virtual] ok");
        assert!(lines.contains(&"  + A (only local)".to_string()));
        assert!(lines.contains(&"  - D (only remote)".to_string()));
        assert!(lines.contains(&"  ~ B: re****ue -> lo****ue".to_string()));
        assert!(!lines.iter().any(|l| l.contains("local-value")));
    }

    #[test]
    fn human_lines_include_sync_counts_and_reasons() {
        let mut outcome = outcome_with_diff(false);
        outcome.diff = None;
        outcome.sync = Some(SyncOutcome {
            set: vec!["A".into()],
            skipped: vec!["B".into(), "C".into()],
        });
        outcome.reasons.push("something broke".into());

        let lines = human_lines(&outcome);

        assert_eq!(lines[1], "  set 1, unchanged 2");
        assert_eq!(lines[2], "  ! something broke");
    }

    #[test]
    fn annotations_are_warnings_by_default() {
        let lines = annotations(&outcome_with_diff(false), false);
        assert_eq!(
            lines,
            vec![
                "::warning ::Only local: A (web)",
                "::warning ::Only remote: D (web)",
                "::warning ::Changed: B (web)",
            ]
        );
    }

    #[test]
    fn fail_on_add_escalates_local_only_keys() {
        let lines = annotations(&outcome_with_diff(true), false);
        assert_eq!(lines[0], "::error ::Only local: A (web)");
        assert_eq!(lines[1], "::warning ::Only remote: D (web)");
    }

    #[test]
    fn ci_strict_escalates_everything() {
        let lines = annotations(&outcome_with_diff(false), true);
        assert!(lines.iter().all(|l| l.starts_with("::error ::")));
    }

    #[test]
    fn ndjson_event_is_single_line() {
        let line = ndjson_event(&outcome_with_diff(false)).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "project");
        assert_eq!(value["project"], "web");
        assert_eq!(value["diff"]["changed"][0], "B");
    }

    #[test]
    fn ndjson_final_carries_final_flag() {
        let report = RunReport {
            ok: false,
            target: DeployTarget::Prod,
            results: vec![outcome_with_diff(false)],
        };
        let value: serde_json::Value = serde_json::from_str(&ndjson_final(&report).unwrap()).unwrap();
        assert_eq!(value["final"], true);
        assert_eq!(value["target"], "prod");
        assert_eq!(value["total"], 1);
    }
}
