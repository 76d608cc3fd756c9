//! Main execution engine - collects steps for an event and runs the pipeline

use crate::{
    collaborators::{default_collaborators, ArtifactType, Collaborator, Environment},
    core::{CollisionPolicy, Event, Pipeline, PipelineContext, RunReport, StepRegistry},
    execution::{ExecutionEvent, StepExecutor},
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Context key holding the project root
pub const CTX_PROJECT_ROOT: &str = "projectRoot";

/// Context key holding the event name
pub const CTX_EVENT: &str = "event";

/// Main pipeline execution engine
pub struct ExecutionEngine {
    collaborators: Vec<Box<dyn Collaborator>>,
    environment: Environment,
    policy: CollisionPolicy,
    executor: StepExecutor,
}

impl ExecutionEngine {
    /// Create an engine over the given collaborators, in discovery order
    pub fn new(collaborators: Vec<Box<dyn Collaborator>>, environment: Environment) -> Self {
        let raw_policy = environment
            .config
            .get_string("marvin.collisionPolicy", "replace");
        let policy = raw_policy.parse().unwrap_or_else(|e| {
            warn!("{}; falling back to replace", e);
            CollisionPolicy::Replace
        });

        Self {
            collaborators,
            environment,
            policy,
            executor: StepExecutor::new(),
        }
    }

    /// Create an engine with the built-in collaborators
    pub fn with_defaults(environment: Environment) -> Self {
        Self::new(default_collaborators(), environment)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Names of the registered collaborators, in discovery order
    pub fn collaborator_names(&self) -> Vec<&str> {
        self.collaborators.iter().map(|c| c.name()).collect()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.executor.add_event_handler(handler);
    }

    /// Ask every collaborator for its steps and merge them in discovery order
    pub fn collect(&self, event: &Event) -> StepRegistry {
        let mut registry = StepRegistry::with_policy(self.policy);

        for collaborator in &self.collaborators {
            let contributed = collaborator.on_event(event, &self.environment);
            if contributed.is_empty() {
                continue;
            }
            debug!(
                "{} contributed {} step(s) to {}: {}",
                collaborator.name(),
                contributed.len(),
                event,
                contributed.names().join(", ")
            );
            registry.merge(contributed);
        }

        registry
    }

    /// Collect and assemble the pipeline for an event
    pub fn plan(&self, event: &Event) -> Pipeline {
        Pipeline::assemble(event.name(), &self.collect(event))
    }

    /// Fresh context for a run of `event`
    pub fn initial_context(&self, event: &Event) -> PipelineContext {
        let mut context = PipelineContext::new();

        if let Some(Value::Object(state)) = self.environment.config.get("marvin.state") {
            for (key, value) in state {
                context.set(key, value);
            }
        }

        context.set(
            CTX_PROJECT_ROOT,
            self.environment.project_root.display().to_string(),
        );
        context.set(CTX_EVENT, event.name());
        context
    }

    /// Plan and execute the pipeline for an event
    pub fn run(&self, event: &Event) -> RunReport {
        let mut context = self.initial_context(event);
        self.run_with_context(event, &mut context)
    }

    /// Plan and execute against a caller-provided context
    pub fn run_with_context(&self, event: &Event, context: &mut PipelineContext) -> RunReport {
        let pipeline = self.plan(event);
        info!(
            "Assembled {} with {} step(s): {}",
            pipeline.name,
            pipeline.len(),
            pipeline.execution_order().join(", ")
        );
        self.executor.execute(&pipeline, context)
    }

    /// Artifact types offered for a project type, keyed by id
    ///
    /// A later collaborator offering the same id overrides the earlier one.
    pub fn artifact_types(&self, project_type: &str) -> BTreeMap<String, ArtifactType> {
        self.collaborators
            .iter()
            .flat_map(|c| c.artifact_types(project_type))
            .map(|t| (t.id.clone(), t))
            .collect()
    }
}
