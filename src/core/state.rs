//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::step::ExitCode;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Steps remain and every earlier step succeeded
    Running,
    /// Every step succeeded
    Completed,
    /// A step returned a non-zero code
    Failed,
}

impl ExecutionStatus {
    /// Whether the run reached its STOPPED state
    pub fn is_stopped(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run yet
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step returned 0
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step returned a non-zero code
    Failed {
        exit_code: ExitCode,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step never ran because an earlier step failed
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }
}

/// Outcome of one step in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub weight: i32,
    pub state: StepState,
}

/// Result of executing a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Name of the executed pipeline
    pub pipeline_name: String,

    /// Current execution status
    pub status: ExecutionStatus,

    /// First non-zero step code, or 0
    pub exit_code: ExitCode,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution stopped
    pub completed_at: Option<DateTime<Utc>>,

    /// One record per step, in execution order
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    /// Create a pending report for the given steps
    pub fn new(execution_id: Uuid, pipeline_name: String, steps: Vec<StepRecord>) -> Self {
        Self {
            execution_id,
            pipeline_name,
            status: ExecutionStatus::Pending,
            exit_code: 0,
            started_at: None,
            completed_at: None,
            steps,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark the run as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.exit_code = 0;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed with the failing step's code
    pub fn fail(&mut self, exit_code: ExitCode) {
        self.status = ExecutionStatus::Failed;
        self.exit_code = exit_code;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    /// Names of the steps that were actually invoked, in order
    pub fn executed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|r| matches!(r.state, StepState::Completed { .. } | StepState::Failed { .. }))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Names of the steps skipped after a failure
    pub fn skipped_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|r| matches!(r.state, StepState::Skipped { .. }))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// The step that stopped the run, if any
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|r| matches!(r.state, StepState::Failed { .. }))
    }

    /// Calculate progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 1.0;
        }
        let done = self.steps.iter().filter(|r| r.state.is_terminal()).count();
        done as f64 / self.steps.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, state: StepState) -> StepRecord {
        StepRecord {
            name: name.to_string(),
            weight: 0,
            state,
        }
    }

    #[test]
    fn test_step_state_is_terminal() {
        assert!(!StepState::Pending.is_terminal());
        assert!(!StepState::Running { started_at: Utc::now() }.is_terminal());
        assert!(StepState::Completed {
            started_at: Utc::now(),
            completed_at: Utc::now()
        }
        .is_terminal());
        assert!(StepState::Failed {
            exit_code: 1,
            started_at: Utc::now(),
            failed_at: Utc::now()
        }
        .is_terminal());
        assert!(StepState::Skipped {
            reason: "test".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn test_report_lifecycle() {
        let mut report = RunReport::new(Uuid::new_v4(), "p".to_string(), vec![]);
        assert_eq!(report.status, ExecutionStatus::Pending);
        assert!(!report.status.is_stopped());

        report.start();
        assert_eq!(report.status, ExecutionStatus::Running);

        report.fail(3);
        assert!(report.status.is_stopped());
        assert_eq!(report.exit_code, 3);
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_queries() {
        let now = Utc::now();
        let report = RunReport::new(
            Uuid::new_v4(),
            "p".to_string(),
            vec![
                record("a", StepState::Completed { started_at: now, completed_at: now }),
                record("b", StepState::Failed { exit_code: 2, started_at: now, failed_at: now }),
                record("c", StepState::Skipped { reason: "b failed".to_string() }),
            ],
        );

        assert_eq!(report.executed_steps(), vec!["a", "b"]);
        assert_eq!(report.skipped_steps(), vec!["c"]);
        assert_eq!(report.failed_step().map(|r| r.name.as_str()), Some("b"));
        assert_eq!(report.progress(), 1.0);
    }
}
