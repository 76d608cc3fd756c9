//! CLI output formatting

use crate::{
    collaborators::ArtifactType,
    core::{ExecutionStatus, Pipeline, RunReport, StepState},
    execution::ExecutionEvent,
};
use console::Emoji;
use std::collections::BTreeMap;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { exit_code, .. } => style(format!("FAILED ({})", exit_code)).red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// One line per step: weight, name and what it does
pub fn format_plan(pipeline: &Pipeline) -> String {
    if pipeline.is_empty() {
        return format!("{} {} has no steps", INFO, style(&pipeline.name).bold());
    }

    let name_width = pipeline
        .steps()
        .iter()
        .map(|step| step.name.len())
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!("{} {}", INFO, style(&pipeline.name).bold())];
    for (index, step) in pipeline.steps().iter().enumerate() {
        lines.push(format!(
            "  {:>3}. {:>6}  {:<width$}  {}",
            index + 1,
            step.weight,
            step.name,
            style(step.describe()).dim(),
            width = name_width
        ));
    }
    lines.join("\n")
}

/// Format the artifact types table
pub fn format_artifact_types(types: &BTreeMap<String, ArtifactType>) -> String {
    if types.is_empty() {
        return format!("{} No artifact types for this project", WARN);
    }

    types
        .values()
        .map(|t| {
            format!(
                "  {} {} {}",
                style(&t.id).cyan(),
                style(&t.label).bold(),
                style(&t.description).dim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the per-step outcome of a finished run
pub fn format_report(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "{} {} {} (exit code {})",
        if report.is_success() { CHECK } else { CROSS },
        style(&report.pipeline_name).bold(),
        format_status(report.status),
        report.exit_code
    )];
    for record in &report.steps {
        lines.push(format!("  {} {}", format_step_state(&record.state), record.name));
    }
    lines.join("\n")
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Starting {} with {} step(s) ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(total_steps).cyan(),
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted { name, index, total } => format!(
            "{} [{}/{}] {}",
            SPINNER,
            style(index + 1).cyan(),
            style(total).dim(),
            style(name).bold()
        ),
        ExecutionEvent::StepCompleted { name } => format!("{} {}", CHECK, style(name).green()),
        ExecutionEvent::StepFailed { name, exit_code } => format!(
            "{} {}: exit code {}",
            CROSS,
            style(name).red(),
            style(exit_code).dim()
        ),
        ExecutionEvent::StepSkipped { name } => format!("{} {} skipped", WARN, style(name).dim()),
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
            exit_code,
        } => {
            let status_str = match status {
                ExecutionStatus::Completed => format!("{} completed", style("successfully").green()),
                ExecutionStatus::Failed => format!("{} with exit code {}", style("failed").red(), exit_code),
                other => format_status(*other),
            };
            format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(&execution_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}
