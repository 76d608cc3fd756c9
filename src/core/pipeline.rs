//! Pipeline domain model - the ordered plan assembled from a registry

use crate::core::{registry::StepRegistry, step::Step};

/// An ordered, immutable sequence of steps
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name (usually the event name)
    pub name: String,

    steps: Vec<Step>,
}

impl Pipeline {
    /// Assemble a pipeline from the current registry contents
    ///
    /// Steps are ordered by ascending weight. The sort is stable, so steps
    /// with equal weight keep the registry's iteration order.
    pub fn assemble(name: impl Into<String>, registry: &StepRegistry) -> Self {
        let mut steps: Vec<Step> = registry.iter().cloned().collect();
        steps.sort_by_key(|step| step.weight);

        Pipeline {
            name: name.into(),
            steps,
        }
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Step names in execution order
    pub fn execution_order(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
