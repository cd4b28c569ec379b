//! Workspace run planning and orchestration.
//!
//! - [`dependency`]: project selection and layered execution order
//! - [`orchestrator`]: per-project diff/sync through providers
//! - [`report`]: human, JSON, NDJSON and CI annotation output

pub mod dependency;
pub mod orchestrator;
pub mod report;

pub use dependency::{plan, DependencyGraph, ExecutionPlan, Selection};
pub use orchestrator::{
    ensure_linked, fail_on_violations, load_project_env, MaskedValue, Orchestrator, ProjectOutcome,
    ProjectStatus, RunOptions, RunProgress, RunReport,
};
pub use report::{
    annotations, human_lines, json_summary, ndjson_event, ndjson_final, AnnotationLevel,
};
