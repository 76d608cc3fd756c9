//! PHP_CodeSniffer and PHPUnit

use super::{Collaborator, Environment};
use crate::composer::ComposerInfo;
use crate::core::{Event, ExitCode, GitHook, Operation, PipelineContext, StepRegistry};
use crate::tasks::{report, ExecTask, PathArg};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Runs phpcs on lint and pre-commit
pub struct PhpcsCollaborator;

impl Collaborator for PhpcsCollaborator {
    fn name(&self) -> &str {
        "phpcs"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        if *event == Event::Lint || event.is_git_hook(GitHook::PreCommit) {
            registry.register(
                "marvin.lint.phpcs",
                -200,
                ExecTask::new(env.setting("phpcsExecutable", "vendor/bin/phpcs"))
                    .current_dir(PathArg::fixed(env.project_root())),
            );
        }

        let dev_mode = matches!(
            event,
            Event::ComposerPostInstall { dev_mode: true } | Event::ComposerPostUpdate { dev_mode: true }
        );
        if dev_mode {
            registry.register(
                "marvin.phpcs.config.installed_paths",
                100,
                PhpcsInstalledPaths {
                    phpcs: env.setting("phpcsExecutable", "vendor/bin/phpcs"),
                    project_root: env.project_root.clone(),
                    paths: installed_paths(env),
                },
            );
        }

        registry
    }
}

/// Coding standard directories phpcs should know about
///
/// `marvin.phpcs.installedPaths` when set, the Drupal coder sniffs otherwise.
fn installed_paths(env: &Environment) -> Vec<String> {
    let configured: Vec<String> = match env.config.get("marvin.phpcs.installedPaths") {
        Some(Value::Array(paths)) => paths
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if !configured.is_empty() {
        return configured;
    }

    let vendor = ComposerInfo::load_or_default(env.project_root())
        .map(|info| info.vendor_dir())
        .unwrap_or_else(|_| "vendor".to_string());
    vec![format!("{}/drupal/coder/coder_sniffer", vendor)]
}

/// `phpcs --config-set installed_paths` with the directories that exist
#[derive(Debug, Clone)]
struct PhpcsInstalledPaths {
    phpcs: String,
    project_root: PathBuf,
    paths: Vec<String>,
}

impl PhpcsInstalledPaths {
    /// The command to run, `None` when none of the paths exist yet
    fn command(&self) -> Option<ExecTask> {
        let existing: Vec<&str> = self
            .paths
            .iter()
            .map(String::as_str)
            .filter(|path| self.project_root.join(path).is_dir())
            .collect();
        if existing.is_empty() {
            return None;
        }

        Some(
            ExecTask::new(self.phpcs.as_str())
                .args(["--config-set", "installed_paths"])
                .arg(existing.join(","))
                .current_dir(PathArg::fixed(&self.project_root)),
        )
    }
}

impl Operation for PhpcsInstalledPaths {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        match self.command() {
            Some(task) => report("phpcs installed_paths", task.execute(ctx)),
            None => {
                debug!("None of {} exist, phpcs installed_paths left as is", self.paths.join(", "));
                0
            }
        }
    }

    fn describe(&self) -> String {
        format!("phpcs --config-set installed_paths {}", self.paths.join(","))
    }
}

/// Runs the unit test suite
pub struct PhpunitCollaborator;

impl Collaborator for PhpunitCollaborator {
    fn name(&self) -> &str {
        "phpunit"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        if *event != Event::TestUnit {
            return registry;
        }

        let mut task = ExecTask::new(env.setting("phpunitExecutable", "vendor/bin/phpunit"))
            .current_dir(PathArg::fixed(env.project_root()));
        let suite = env.setting("phpunit.testSuite", "");
        if !suite.is_empty() {
            task = task.arg(format!("--testsuite={}", suite));
        }

        registry.register("marvin.test.unit", 0, task);
        registry
    }
}
