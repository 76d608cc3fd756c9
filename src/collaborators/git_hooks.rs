//! Git hook collaborators

use super::{Collaborator, Environment};
use crate::core::{Event, GitHook, StepRegistry};
use crate::tasks::{CommitMsgRule, CommitMsgValidator, GitHooksDeploy, GitListChangedFiles, PathArg};
use tracing::warn;

/// Context key listing the files a checkout changed
pub const CTX_CHANGED_FILES: &str = "changed.fileNames";

pub const RULES_KEY: &str = "marvin.git-hook.commit-msg.settings.rules";

/// Lists changed files on post-checkout for later notification steps
pub struct ChangedFilesCollaborator;

impl Collaborator for ChangedFilesCollaborator {
    fn name(&self) -> &str {
        "git-hook.changed-files"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        if !event.is_git_hook(GitHook::PostCheckout) {
            return registry;
        }

        let (Some(previous), Some(head)) = (event.hook_arg(0), event.hook_arg(1)) else {
            warn!("post-checkout called without revisions");
            return registry;
        };

        registry.register(
            "marvin:git-list-changed-files",
            -900,
            GitListChangedFiles::new(
                env.setting("gitExecutable", "git"),
                PathArg::fixed(env.project_root()),
                previous,
                head,
                CTX_CHANGED_FILES,
            ),
        );
        registry
    }
}

/// Validates commit messages when rules are configured
pub struct CommitMsgCollaborator;

impl Collaborator for CommitMsgCollaborator {
    fn name(&self) -> &str {
        "git-hook.commit-msg"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        if !event.is_git_hook(GitHook::CommitMsg) {
            return registry;
        }

        let rules = env
            .config
            .get(RULES_KEY)
            .map(|value| CommitMsgRule::from_config(&value))
            .unwrap_or_default();
        if !rules.iter().any(|r| r.enabled) {
            return registry;
        }

        let file = event.hook_arg(0).unwrap_or(".git/COMMIT_EDITMSG");
        registry.register(
            "marvin.commit-msg-validator",
            0,
            CommitMsgValidator::new(env.project_root(), file, rules),
        );
        registry
    }
}

/// Installs the hook scripts after composer install/update or on demand
pub struct GitHooksDeployCollaborator;

impl Collaborator for GitHooksDeployCollaborator {
    fn name(&self) -> &str {
        "git-hooks.deploy"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        if matches!(
            event,
            Event::ComposerPostInstall { .. } | Event::ComposerPostUpdate { .. } | Event::GitHooksDeploy
        ) {
            registry.register(
                "marvin.gitHooks.deploy",
                -200,
                GitHooksDeploy::new(env.project_root(), &env.executable),
            );
        }
        registry
    }
}
