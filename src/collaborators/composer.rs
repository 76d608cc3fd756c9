//! composer.json validation and install reminders

use super::git_hooks::CTX_CHANGED_FILES;
use super::{Collaborator, Environment};
use crate::core::{Event, GitHook, StepRegistry};
use crate::tasks::{ChangedFilesNotification, ExecTask, PathArg};

pub struct ComposerCollaborator;

impl Collaborator for ComposerCollaborator {
    fn name(&self) -> &str {
        "composer"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();

        if *event == Event::Lint || event.is_git_hook(GitHook::PreCommit) {
            registry.register(
                "marvin:lint:composer-validate",
                -201,
                ExecTask::new(env.setting("composerExecutable", "composer"))
                    .arg("validate")
                    .current_dir(PathArg::fixed(env.project_root())),
            );
        }

        if event.is_git_hook(GitHook::PostCheckout) {
            registry.register(
                "marvin:composer-install",
                100,
                ChangedFilesNotification::new(
                    CTX_CHANGED_FILES,
                    ["composer.json", "composer.lock"],
                    "composer install",
                ),
            );
        }

        registry
    }
}
