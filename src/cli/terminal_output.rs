//! Terminal output for running pipelines
//!
//! Steps usually spawn processes that write straight to the terminal, so each
//! step gets a `[N/M] name` header and a separator to tell their output apart.

use super::output::format_execution_event;
use crate::execution::ExecutionEvent;
use console::style;
use std::io::{self, Write};

/// Prints execution events as they happen
#[derive(Debug, Clone, Default)]
pub struct TerminalOutput {
    /// Print step headers and separators, not only failures and the summary
    verbose: bool,
}

impl TerminalOutput {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Format: `[N/M] Step Name`
    pub fn step_header(index: usize, total: usize, name: &str) -> String {
        format!(
            "[{}/{}] {}",
            style(index + 1).cyan(),
            style(total).dim(),
            style(name).bold()
        )
    }

    /// A horizontal rule spanning the terminal width
    pub fn separator() -> String {
        let width = term_size::dimensions_stdout()
            .map(|(w, _)| w)
            .unwrap_or(80);
        style("─".repeat(width)).dim().to_string()
    }

    pub fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::StepStarted { name, index, total } => {
                if self.verbose || *total > 1 {
                    println!("{}", Self::separator());
                }
                println!("{}", Self::step_header(*index, *total, name));
                self.flush_stdout();
            }
            ExecutionEvent::PipelineStarted { .. }
            | ExecutionEvent::StepCompleted { .. }
            | ExecutionEvent::StepSkipped { .. } => {
                if self.verbose {
                    println!("{}", format_execution_event(event));
                }
            }
            ExecutionEvent::StepFailed { .. } | ExecutionEvent::PipelineCompleted { .. } => {
                println!("{}", format_execution_event(event));
            }
        }
    }

    fn flush_stdout(&self) {
        let _ = io::stdout().flush();
    }
}
