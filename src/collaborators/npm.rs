//! Frontend dependencies

use super::git_hooks::CTX_CHANGED_FILES;
use super::{Collaborator, Environment};
use crate::core::{Event, ExitCode, GitHook, Operation, PipelineContext, StepRegistry};
use crate::tasks::{ChangedFilesNotification, ExecTask, PathArg};
use std::path::PathBuf;
use tracing::info;

pub struct NpmCollaborator;

impl Collaborator for NpmCollaborator {
    fn name(&self) -> &str {
        "npm"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();

        if *event == Event::Build {
            registry.register(
                "marvin.build.npm",
                -200,
                NpmInstall {
                    dir: env.project_root.clone(),
                    yarn: env.setting("yarnExecutable", "yarn"),
                    npm: env.setting("npmExecutable", "npm"),
                },
            );
        }

        if event.is_git_hook(GitHook::PostCheckout) {
            registry.register(
                "marvin:yarn-install",
                100,
                ChangedFilesNotification::new(
                    CTX_CHANGED_FILES,
                    ["package.json", "yarn.lock"],
                    "yarn install",
                ),
            );
        }

        registry
    }
}

/// Installs node packages with yarn when a yarn.lock exists, npm otherwise
#[derive(Debug, Clone)]
struct NpmInstall {
    dir: PathBuf,
    yarn: String,
    npm: String,
}

impl NpmInstall {
    /// The install command for the directory's current state, if any
    fn command(&self) -> Option<ExecTask> {
        if !self.dir.join("package.json").is_file() {
            return None;
        }

        let program = if self.dir.join("yarn.lock").is_file() {
            &self.yarn
        } else {
            &self.npm
        };
        Some(
            ExecTask::new(program.as_str())
                .arg("install")
                .current_dir(PathArg::fixed(&self.dir)),
        )
    }
}

impl Operation for NpmInstall {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        match self.command() {
            Some(task) => task.run(ctx),
            None => {
                info!("No package.json in {}; skipping", self.dir.display());
                0
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} or {} install", self.yarn, self.npm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MarvinConfig;
    use std::sync::Arc;

    fn install(dir: &std::path::Path) -> NpmInstall {
        NpmInstall {
            dir: dir.to_path_buf(),
            yarn: "yarn".to_string(),
            npm: "npm".to_string(),
        }
    }

    #[test]
    fn test_picks_package_manager() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(install(tmp.path()).command().is_none());
        assert_eq!(install(tmp.path()).run(&mut PipelineContext::new()), 0);

        std::fs::write(tmp.path().join("package.json"), "{}").unwrap();
        assert_eq!(
            install(tmp.path()).command().unwrap().command_line(),
            "npm install"
        );

        std::fs::write(tmp.path().join("yarn.lock"), "").unwrap();
        assert_eq!(
            install(tmp.path()).command().unwrap().command_line(),
            "yarn install"
        );
    }

    #[test]
    fn test_steps_per_event() {
        let env = Environment::new("/srv/site", Arc::new(MarvinConfig::defaults()));
        let collaborator = NpmCollaborator;

        let build = collaborator.on_event(&Event::Build, &env);
        assert_eq!(build.get("marvin.build.npm").map(|s| s.weight), Some(-200));

        let post_checkout = Event::GitHook {
            hook: GitHook::PostCheckout,
            args: vec![],
        };
        assert_eq!(
            collaborator.on_event(&post_checkout, &env).get("marvin:yarn-install").map(|s| s.weight),
            Some(100)
        );
        assert!(collaborator.on_event(&Event::Lint, &env).is_empty());
    }
}
