//! Events - the commands whose pipelines collaborators contribute to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Git hooks a pipeline can be dispatched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitHook {
    ApplypatchMsg,
    CommitMsg,
    PostApplypatch,
    PostCheckout,
    PostCommit,
    PostMerge,
    PostReceive,
    PostRewrite,
    PostUpdate,
    PreApplypatch,
    PreAutoGc,
    PreCommit,
    PrePush,
    PreRebase,
    PreReceive,
    PrepareCommitMsg,
    PushToCheckout,
    Update,
}

impl GitHook {
    /// Every supported hook, in alphabetical order
    pub const ALL: [GitHook; 18] = [
        GitHook::ApplypatchMsg,
        GitHook::CommitMsg,
        GitHook::PostApplypatch,
        GitHook::PostCheckout,
        GitHook::PostCommit,
        GitHook::PostMerge,
        GitHook::PostReceive,
        GitHook::PostRewrite,
        GitHook::PostUpdate,
        GitHook::PreApplypatch,
        GitHook::PreAutoGc,
        GitHook::PreCommit,
        GitHook::PrePush,
        GitHook::PreRebase,
        GitHook::PreReceive,
        GitHook::PrepareCommitMsg,
        GitHook::PushToCheckout,
        GitHook::Update,
    ];

    /// The file name Git uses for this hook
    pub fn as_str(&self) -> &'static str {
        match self {
            GitHook::ApplypatchMsg => "applypatch-msg",
            GitHook::CommitMsg => "commit-msg",
            GitHook::PostApplypatch => "post-applypatch",
            GitHook::PostCheckout => "post-checkout",
            GitHook::PostCommit => "post-commit",
            GitHook::PostMerge => "post-merge",
            GitHook::PostReceive => "post-receive",
            GitHook::PostRewrite => "post-rewrite",
            GitHook::PostUpdate => "post-update",
            GitHook::PreApplypatch => "pre-applypatch",
            GitHook::PreAutoGc => "pre-auto-gc",
            GitHook::PreCommit => "pre-commit",
            GitHook::PrePush => "pre-push",
            GitHook::PreRebase => "pre-rebase",
            GitHook::PreReceive => "pre-receive",
            GitHook::PrepareCommitMsg => "prepare-commit-msg",
            GitHook::PushToCheckout => "push-to-checkout",
            GitHook::Update => "update",
        }
    }
}

impl fmt::Display for GitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GitHook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GitHook::ALL
            .iter()
            .copied()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| format!("Unknown Git hook: {}", s))
    }
}

/// A command whose pipeline is assembled from collaborator contributions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Build a release artifact of the given type
    ArtifactBuild {
        artifact_type: String,
        /// Semver part name to bump, or an exact version number
        version_bump: String,
    },
    /// Prepare a fresh checkout for local development
    Onboarding { url: Option<String> },
    ComposerPostInstall { dev_mode: bool },
    ComposerPostUpdate { dev_mode: bool },
    /// A Git hook fired, with the arguments Git passed to it
    GitHook { hook: GitHook, args: Vec<String> },
    GitHooksDeploy,
    Lint,
    Build,
    TestUnit,
    /// Run every Behat suite of the project
    TestBehat,
    /// Import the content of a migration group defined under `marvin.migrate.<group>`
    Migrate { group: String },
}

impl Event {
    /// Stable event name, also used as the pipeline name
    pub fn name(&self) -> String {
        match self {
            Event::ArtifactBuild { artifact_type, .. } => {
                format!("marvin:artifact:build:{}", artifact_type)
            }
            Event::Onboarding { .. } => "marvin:onboarding".to_string(),
            Event::ComposerPostInstall { .. } => "marvin:composer:post-install-cmd".to_string(),
            Event::ComposerPostUpdate { .. } => "marvin:composer:post-update-cmd".to_string(),
            Event::GitHook { hook, .. } => format!("marvin:git-hook:{}", hook),
            Event::GitHooksDeploy => "marvin:git-hooks:deploy".to_string(),
            Event::Lint => "marvin:lint".to_string(),
            Event::Build => "marvin:build".to_string(),
            Event::TestUnit => "marvin:test:unit".to_string(),
            Event::TestBehat => "marvin:test:behat".to_string(),
            Event::Migrate { .. } => "marvin:migrate".to_string(),
        }
    }

    /// Whether this is the given Git hook
    pub fn is_git_hook(&self, expected: GitHook) -> bool {
        matches!(self, Event::GitHook { hook, .. } if *hook == expected)
    }

    /// Positional Git hook argument, if this is a Git hook event
    pub fn hook_arg(&self, index: usize) -> Option<&str> {
        match self {
            Event::GitHook { args, .. } => args.get(index).map(String::as_str),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_hook_names_round_trip_through_from_str() {
        for hook in GitHook::ALL {
            assert_eq!(hook.as_str().parse::<GitHook>(), Ok(hook));
        }
        assert!("pre-nothing".parse::<GitHook>().is_err());
    }

    #[test]
    fn test_event_names() {
        let build = Event::ArtifactBuild {
            artifact_type: "vanilla".to_string(),
            version_bump: "minor".to_string(),
        };
        assert_eq!(build.name(), "marvin:artifact:build:vanilla");

        let hook = Event::GitHook {
            hook: GitHook::PreCommit,
            args: vec![],
        };
        assert_eq!(hook.to_string(), "marvin:git-hook:pre-commit");
        assert_eq!(Event::Lint.name(), "marvin:lint");
        assert_eq!(Event::TestBehat.name(), "marvin:test:behat");
        assert_eq!(
            Event::Migrate {
                group: "default".to_string()
            }
            .name(),
            "marvin:migrate"
        );
    }

    #[test]
    fn test_hook_args() {
        let event = Event::GitHook {
            hook: GitHook::PostCheckout,
            args: vec!["abc".to_string(), "def".to_string(), "1".to_string()],
        };

        assert!(event.is_git_hook(GitHook::PostCheckout));
        assert!(!event.is_git_hook(GitHook::PreCommit));
        assert_eq!(event.hook_arg(1), Some("def"));
        assert_eq!(event.hook_arg(5), None);
        assert_eq!(Event::Lint.hook_arg(0), None);
    }
}
