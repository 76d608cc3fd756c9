//! Step domain model

use crate::core::context::PipelineContext;
use std::fmt;
use std::sync::Arc;

/// Exit code reported by an operation; 0 means success
pub type ExitCode = i32;

/// A unit of work carried by a step
///
/// Operations get every setting they need at construction time and only
/// exchange data with other steps through the context.
pub trait Operation: Send + Sync {
    /// Run the operation against the shared context
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode;

    /// Short human-readable summary, used when listing a plan
    fn describe(&self) -> String {
        String::new()
    }
}

impl<F> Operation for F
where
    F: Fn(&mut PipelineContext) -> ExitCode + Send + Sync,
{
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        self(ctx)
    }
}

/// A single named, weighted step
#[derive(Clone)]
pub struct Step {
    /// Unique step name within a registry
    pub name: String,

    /// Ordering weight; lower runs earlier
    pub weight: i32,

    /// The work to do
    pub operation: Arc<dyn Operation>,
}

impl Step {
    pub fn new(name: impl Into<String>, weight: i32, operation: impl Operation + 'static) -> Self {
        Self {
            name: name.into(),
            weight,
            operation: Arc::new(operation),
        }
    }

    /// Create a step from an already shared operation
    pub fn from_shared(name: impl Into<String>, weight: i32, operation: Arc<dyn Operation>) -> Self {
        Self {
            name: name.into(),
            weight,
            operation,
        }
    }

    /// Run this step's operation
    pub fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        self.operation.run(ctx)
    }

    pub fn describe(&self) -> String {
        self.operation.describe()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("operation", &self.operation.describe())
            .finish()
    }
}
