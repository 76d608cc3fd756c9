//! Install marvin's Git hook scripts into a repository

use super::fs::remove_path;
use super::{report, TaskError};
use crate::core::{ExitCode, GitHook, Operation, PipelineContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Replaces `.git/hooks` content with scripts that call back into marvin
#[derive(Debug, Clone)]
pub struct GitHooksDeploy {
    project_root: PathBuf,
    executable: PathBuf,
    hooks: Vec<GitHook>,
}

impl GitHooksDeploy {
    /// Deploy every known hook
    pub fn new(project_root: impl Into<PathBuf>, executable: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            executable: executable.into(),
            hooks: GitHook::ALL.to_vec(),
        }
    }

    /// The repository directory behind `<projectRoot>/.git`
    ///
    /// A `.git` file (submodules, worktrees) points elsewhere with a
    /// `gitdir: <path>` line.
    pub fn git_dir(&self) -> Result<Option<PathBuf>, TaskError> {
        let dot_git = self.project_root.join(".git");
        if !dot_git.exists() {
            return Ok(None);
        }
        if dot_git.is_dir() {
            return Ok(Some(dot_git));
        }

        let content = fs::read_to_string(&dot_git).map_err(|e| TaskError::io(&dot_git, e))?;
        Ok(content
            .lines()
            .find_map(|line| line.strip_prefix("gitdir:"))
            .map(|dir| self.project_root.join(dir.trim())))
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.project_root.join(".git").join("hooks")
    }

    /// Content of the script for one hook
    pub fn script(&self, hook: GitHook) -> String {
        format!(
            "#!/usr/bin/env sh\n\n# Generated by marvin. Local changes are overwritten on the next deploy.\n\nexec {} --project-root {} git-hook {} \"$@\"\n",
            shell_quote(&self.executable.display().to_string()),
            shell_quote(&self.project_root.display().to_string()),
            hook,
        )
    }

    pub fn execute(&self) -> Result<(), TaskError> {
        let Some(git_dir) = self.git_dir()? else {
            error!(
                "{} is not a Git repository, hooks are not deployed",
                self.project_root.display()
            );
            return Ok(());
        };

        let hooks_dir = git_dir.join("hooks");
        prepare_hooks_dir(&hooks_dir)?;

        for hook in &self.hooks {
            let path = hooks_dir.join(hook.as_str());
            fs::write(&path, self.script(*hook)).map_err(|e| TaskError::io(&path, e))?;
            make_executable(&path)?;
        }

        info!("Deployed {} Git hooks to {}", self.hooks.len(), hooks_dir.display());
        Ok(())
    }
}

impl Operation for GitHooksDeploy {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("GitHooksDeploy", self.execute())
    }

    fn describe(&self) -> String {
        format!("deploy {} Git hooks", self.hooks.len())
    }
}

/// Create the directory, or remove its direct children that are not dot files
fn prepare_hooks_dir(dir: &Path) -> Result<(), TaskError> {
    if fs::symlink_metadata(dir).is_ok_and(|m| m.file_type().is_symlink()) {
        fs::remove_file(dir).map_err(|e| TaskError::io(dir, e))?;
    }

    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(|e| TaskError::io(dir, e));
    }

    let entries = fs::read_dir(dir).map_err(|e| TaskError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| TaskError::io(dir, e))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        debug!("Removing {}", entry.path().display());
        remove_path(&entry.path())?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), TaskError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| TaskError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), TaskError> {
    Ok(())
}

/// Single-quote a value for sh
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
