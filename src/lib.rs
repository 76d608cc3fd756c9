//! marvin - Drupal project lifecycle tasks as weighted step pipelines

pub mod cli;
pub mod collaborators;
pub mod composer;
pub mod core;
pub mod env_config;
pub mod execution;
pub mod tasks;

// Re-export commonly used types
pub use collaborators::{default_collaborators, ArtifactType, Collaborator, Environment};
pub use core::{
    CollisionPolicy, Event, ExecutionStatus, GitHook, MarvinConfig, Operation, Pipeline,
    PipelineContext, RunReport, Step, StepRegistry,
};
pub use execution::{ExecutionEngine, ExecutionEvent, StepExecutor};
