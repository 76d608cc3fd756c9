//! Step registry - named, weighted steps collected from collaborators

use crate::core::step::{Operation, Step};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do when a step name is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later registration silently replaces the earlier one
    #[default]
    Replace,
    /// Later registration replaces the earlier one and a warning is logged
    Warn,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(CollisionPolicy::Replace),
            "warn" => Ok(CollisionPolicy::Warn),
            other => Err(format!("Unknown collision policy: {}", other)),
        }
    }
}

/// Mapping from step name to weighted operation
///
/// Iteration order is registration order. Replacing an entry keeps the
/// position of the first registration under that name.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: Vec<Step>,
    policy: CollisionPolicy,
    collisions: Vec<String>,
}

impl StepRegistry {
    /// Create an empty registry with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given collision policy
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Insert or replace the entry for `name`
    pub fn register(&mut self, name: impl Into<String>, weight: i32, operation: impl Operation + 'static) {
        self.insert(Step::from_shared(name, weight, Arc::new(operation)));
    }

    /// Builder-style variant of [`StepRegistry::register`]
    pub fn with(mut self, name: impl Into<String>, weight: i32, operation: impl Operation + 'static) -> Self {
        self.register(name, weight, operation);
        self
    }

    /// Insert or replace a prebuilt step
    pub fn insert(&mut self, step: Step) {
        match self.steps.iter().position(|s| s.name == step.name) {
            Some(index) => {
                let previous = &self.steps[index];
                match self.policy {
                    CollisionPolicy::Replace => debug!(
                        "Step {} replaced (weight {} -> {})",
                        step.name, previous.weight, step.weight
                    ),
                    CollisionPolicy::Warn => warn!(
                        "Step {} registered twice; weight {} entry replaced by weight {} entry",
                        step.name, previous.weight, step.weight
                    ),
                }
                self.collisions.push(step.name.clone());
                self.steps[index] = step;
            }
            None => self.steps.push(step),
        }
    }

    /// Merge another registry into this one; entries of `other` win on name collision
    ///
    /// Collisions recorded inside `other` carry over.
    pub fn merge(&mut self, other: StepRegistry) {
        if self.policy == CollisionPolicy::Warn {
            for name in &other.collisions {
                warn!("Step {} registered twice by the same contributor", name);
            }
        }
        self.collisions.extend(other.collisions);

        for step in other.steps {
            self.insert(step);
        }
    }

    /// Get a step by name
    pub fn get(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Names that were registered more than once, in collision order
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }
}
