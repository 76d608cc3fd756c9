//! Behat suites

use super::artifact::relative_path;
use super::{Collaborator, Environment};
use crate::composer::ComposerInfo;
use crate::core::{Event, ExitCode, Operation, PipelineContext, StepRegistry};
use crate::tasks::{report, ExecTask, GitListFiles, PathArg};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tracked `behat.yml` files, relative to the project root
pub const CTX_BEHAT_CONFIGS: &str = "files";

pub struct BehatCollaborator;

impl Collaborator for BehatCollaborator {
    fn name(&self) -> &str {
        "behat"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        if *event != Event::TestBehat {
            return registry;
        }

        let bin_dir = match ComposerInfo::load_or_default(env.project_root()) {
            Ok(info) => info.bin_dir(),
            Err(e) => {
                warn!("{}; falling back to vendor/bin", e);
                "vendor/bin".to_string()
            }
        };

        registry.register(
            "marvin.test.behat.configFinder",
            0,
            GitListFiles::new(
                env.setting("gitExecutable", "git"),
                PathArg::fixed(env.project_root()),
                CTX_BEHAT_CONFIGS,
            )
            .pathspecs(["behat.yml", "*/behat.yml"]),
        );
        registry.register(
            "marvin.test.behat.runAll",
            100,
            BehatRunAll {
                project_root: env.project_root.clone(),
                bin_dir: PathBuf::from(bin_dir),
            },
        );
        registry
    }
}

/// Runs behat once per config file, stopping at the first failing suite
#[derive(Debug, Clone)]
struct BehatRunAll {
    project_root: PathBuf,
    bin_dir: PathBuf,
}

impl Operation for BehatRunAll {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        let files = ctx.get_string_list(CTX_BEHAT_CONFIGS).unwrap_or_default();
        if files.is_empty() {
            debug!("There is no behat.yml in {}", self.project_root.display());
            return 0;
        }

        for file in files {
            let code = report("behat", behat_command(&self.project_root, &self.bin_dir, &file).execute(ctx));
            if code != 0 {
                return code;
            }
        }
        0
    }

    fn describe(&self) -> String {
        format!("behat for every <{}>", CTX_BEHAT_CONFIGS)
    }
}

/// behat of the project, started from the directory of `behat_yml`
pub fn behat_command(project_root: &Path, bin_dir: &Path, behat_yml: &str) -> ExecTask {
    let behat_dir = Path::new(behat_yml).parent().unwrap_or(Path::new(""));
    let back_to_root = relative_path(Path::new(""), behat_dir);
    let executable = back_to_root.join(bin_dir).join("behat");

    let working_dir = if behat_dir.as_os_str().is_empty() {
        project_root.to_path_buf()
    } else {
        project_root.join(behat_dir)
    };

    ExecTask::new(executable.display().to_string()).current_dir(PathArg::fixed(working_dir))
}
