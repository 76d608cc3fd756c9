//! Step executor - runs an assembled pipeline step by step

use crate::core::{
    ExecutionStatus, ExitCode, Pipeline, PipelineContext, RunReport, StepRecord, StepState,
};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        name: String,
        /// Zero-based position in the pipeline
        index: usize,
        total: usize,
    },
    StepCompleted {
        name: String,
    },
    StepFailed {
        name: String,
        exit_code: ExitCode,
    },
    StepSkipped {
        name: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
        exit_code: ExitCode,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Runs the steps of a pipeline in order until one fails
#[derive(Default, Clone)]
pub struct StepExecutor {
    event_handlers: Vec<EventHandler>,
}

impl StepExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Execute every step against the shared context
    ///
    /// The first non-zero exit code stops the run; later steps are recorded
    /// as skipped and never invoked.
    pub fn execute(&self, pipeline: &Pipeline, context: &mut PipelineContext) -> RunReport {
        let total = pipeline.len();
        let records = pipeline
            .steps()
            .iter()
            .map(|step| StepRecord {
                name: step.name.clone(),
                weight: step.weight,
                state: StepState::Pending,
            })
            .collect();

        let mut report = RunReport::new(context.execution_id, pipeline.name.clone(), records);

        info!(
            "Starting pipeline execution: {} ({}, {} steps)",
            pipeline.name, context.execution_id, total
        );
        report.start();
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id: context.execution_id,
            pipeline_name: pipeline.name.clone(),
            total_steps: total,
        });

        let mut failure: Option<(String, ExitCode)> = None;

        for (index, step) in pipeline.steps().iter().enumerate() {
            if let Some((failed_name, _)) = &failure {
                report.steps[index].state = StepState::Skipped {
                    reason: format!("{} failed", failed_name),
                };
                self.emit_event(ExecutionEvent::StepSkipped {
                    name: step.name.clone(),
                });
                continue;
            }

            let started_at = Utc::now();
            report.steps[index].state = StepState::Running { started_at };
            info!("Executing step: {} (weight {})", step.name, step.weight);
            self.emit_event(ExecutionEvent::StepStarted {
                name: step.name.clone(),
                index,
                total,
            });

            let exit_code = step.run(context);

            if exit_code == 0 {
                debug!("Step {} completed", step.name);
                report.steps[index].state = StepState::Completed {
                    started_at,
                    completed_at: Utc::now(),
                };
                self.emit_event(ExecutionEvent::StepCompleted {
                    name: step.name.clone(),
                });
            } else {
                error!("Step {} failed with exit code {}", step.name, exit_code);
                report.steps[index].state = StepState::Failed {
                    exit_code,
                    started_at,
                    failed_at: Utc::now(),
                };
                self.emit_event(ExecutionEvent::StepFailed {
                    name: step.name.clone(),
                    exit_code,
                });
                failure = Some((step.name.clone(), exit_code));
            }
        }

        match failure {
            Some((_, exit_code)) => report.fail(exit_code),
            None => report.complete(),
        }

        info!(
            "Pipeline {} finished: {:?} (exit code {})",
            pipeline.name, report.status, report.exit_code
        );
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id: report.execution_id,
            status: report.status,
            exit_code: report.exit_code,
        });

        report
    }
}

impl fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepExecutor")
            .field("event_handlers", &self.event_handlers.len())
            .finish()
    }
}
