//! Collaborators - independent contributors of steps to event pipelines
//!
//! Every collaborator is asked for its steps when an event's pipeline is
//! built, and answers with a registry (empty when it has nothing to add).
//! The engine merges the answers in discovery order.

pub mod artifact;
pub mod behat;
pub mod composer;
pub mod git_hooks;
pub mod lint;
pub mod migrate;
pub mod npm;
pub mod onboarding;

use crate::core::{ConfigLookup, Event, StepRegistry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contributes steps to the pipelines of the events it cares about
pub trait Collaborator: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Steps to add for `event`
    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry;

    /// Artifact types this collaborator can build for a project type
    fn artifact_types(&self, _project_type: &str) -> Vec<ArtifactType> {
        Vec::new()
    }
}

/// What collaborators may consult while building their steps
#[derive(Clone)]
pub struct Environment {
    pub project_root: PathBuf,
    pub config: Arc<dyn ConfigLookup>,
    /// The marvin binary Git hook scripts call back into
    pub executable: PathBuf,
}

impl Environment {
    pub fn new(project_root: impl Into<PathBuf>, config: Arc<dyn ConfigLookup>) -> Self {
        let executable = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("marvin"));
        Self {
            project_root: project_root.into(),
            config,
            executable,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// A `marvin.*` setting as a string
    pub fn setting(&self, name: &str, default: &str) -> String {
        self.config.get_string(&format!("marvin.{}", name), default)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("project_root", &self.project_root)
            .field("executable", &self.executable)
            .finish_non_exhaustive()
    }
}

/// A kind of release artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactType {
    pub id: String,
    pub label: String,
    pub description: String,
}

impl ArtifactType {
    pub fn new(id: impl Into<String>, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
        }
    }
}

/// The built-in collaborators, in discovery order
pub fn default_collaborators() -> Vec<Box<dyn Collaborator>> {
    vec![
        Box::new(git_hooks::ChangedFilesCollaborator),
        Box::new(git_hooks::CommitMsgCollaborator),
        Box::new(composer::ComposerCollaborator),
        Box::new(npm::NpmCollaborator),
        Box::new(lint::PhpcsCollaborator),
        Box::new(lint::PhpunitCollaborator),
        Box::new(behat::BehatCollaborator),
        Box::new(git_hooks::GitHooksDeployCollaborator),
        Box::new(onboarding::OnboardingCollaborator),
        Box::new(migrate::MigrateCollaborator),
        Box::new(artifact::VanillaArtifactCollaborator),
    ]
}
