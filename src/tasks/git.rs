//! Git queries

use super::exec::capture;
use super::version::parse_version;
use super::{report, PathArg, TaskError};
use crate::core::{ExitCode, Operation, PipelineContext};
use semver::Version;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Tracked files matching the given pathspecs (all files when empty)
pub fn list_files(git: &str, dir: &Path, pathspecs: &[String]) -> Result<Vec<String>, TaskError> {
    let mut args = vec!["ls-files".to_string()];
    if !pathspecs.is_empty() {
        args.push("--".to_string());
        args.extend(pathspecs.iter().cloned());
    }
    let stdout = capture(git, &args, dir)?;
    Ok(lines(&stdout))
}

/// Files changed between two revisions
pub fn list_changed_files(git: &str, dir: &Path, from: &str, to: &str) -> Result<Vec<String>, TaskError> {
    let range = format!("{}..{}", from, to);
    let stdout = capture(git, ["diff", "--name-only", range.as_str()], dir)?;
    Ok(lines(&stdout))
}

/// Highest semver tag in the repository, or 0.0.0
///
/// Tags may carry a leading `v`. Tags that are not versions are ignored, and
/// so is a failing `git tag`.
pub fn latest_version_tag(git: &str, dir: &Path) -> Version {
    let tags = match capture(git, ["tag", "--list"], dir) {
        Ok(stdout) => stdout,
        Err(e) => {
            warn!("Could not list Git tags in {}: {}", dir.display(), e);
            return Version::new(0, 0, 0);
        }
    };

    highest_version(tags.lines())
}

/// Highest parseable version among `tags`, or 0.0.0
pub fn highest_version<'a>(tags: impl IntoIterator<Item = &'a str>) -> Version {
    tags.into_iter()
        .filter_map(|tag| parse_version(tag.trim()).ok())
        .max()
        .unwrap_or_else(|| Version::new(0, 0, 0))
}

/// Drop the files that live under `dir`, a path relative to the listing root
pub fn without_dir(files: Vec<String>, dir: &Path) -> Vec<String> {
    let dir: PathBuf = dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if dir.as_os_str().is_empty() {
        return files;
    }

    files
        .into_iter()
        .filter(|file| !Path::new(file).starts_with(&dir))
        .collect()
}

fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write the tracked files of a directory into the context
#[derive(Debug, Clone)]
pub struct GitListFiles {
    git: String,
    dir: PathArg,
    pathspecs: Vec<String>,
    /// Files under this relative directory are left out
    exclude_dir: Option<String>,
    output_key: String,
}

impl GitListFiles {
    pub fn new(git: impl Into<String>, dir: PathArg, output_key: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            dir,
            pathspecs: Vec::new(),
            exclude_dir: None,
            output_key: output_key.into(),
        }
    }

    pub fn pathspecs<I, S>(mut self, pathspecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pathspecs = pathspecs.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude_dir(mut self, dir: impl Into<String>) -> Self {
        self.exclude_dir = Some(dir.into());
        self
    }

    pub fn execute(&self, ctx: &mut PipelineContext) -> Result<(), TaskError> {
        let dir = self.dir.resolve(ctx)?;
        let mut files = list_files(&self.git, &dir, &self.pathspecs)?;

        if let Some(exclude) = &self.exclude_dir {
            files = without_dir(files, Path::new(exclude));
        }

        debug!("{} tracked file(s) in {}", files.len(), dir.display());
        ctx.set(
            self.output_key.as_str(),
            Value::from(files),
        );
        Ok(())
    }
}

impl Operation for GitListFiles {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        report("GitListFiles", self.execute(ctx))
    }

    fn describe(&self) -> String {
        format!("git ls-files in {} -> {}", self.dir, self.output_key)
    }
}

/// Write the files changed between two revisions into the context
#[derive(Debug, Clone)]
pub struct GitListChangedFiles {
    git: String,
    dir: PathArg,
    from: String,
    to: String,
    output_key: String,
}

impl GitListChangedFiles {
    pub fn new(
        git: impl Into<String>,
        dir: PathArg,
        from: impl Into<String>,
        to: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            git: git.into(),
            dir,
            from: from.into(),
            to: to.into(),
            output_key: output_key.into(),
        }
    }

    pub fn execute(&self, ctx: &mut PipelineContext) -> Result<(), TaskError> {
        let dir = self.dir.resolve(ctx)?;
        let files = list_changed_files(&self.git, &dir, &self.from, &self.to)?;
        debug!("{} file(s) changed in {}..{}", files.len(), self.from, self.to);
        ctx.set(self.output_key.as_str(), Value::from(files));
        Ok(())
    }
}

impl Operation for GitListChangedFiles {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        report("GitListChangedFiles", self.execute(ctx))
    }

    fn describe(&self) -> String {
        format!("git diff --name-only {}..{} -> {}", self.from, self.to, self.output_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_highest_version_ignores_non_versions() {
        let tags = ["v1.2.0", "1.10.0", "nightly", "1.9.9", "2.0.0-beta1", ""];
        assert_eq!(highest_version(tags), Version::parse("2.0.0-beta1").unwrap());
    }

    #[test]
    fn test_highest_version_defaults_to_zero() {
        assert_eq!(highest_version(["latest"]), Version::new(0, 0, 0));
        assert_eq!(highest_version(Vec::<&str>::new()), Version::new(0, 0, 0));
    }

    #[test]
    fn test_latest_version_tag_outside_repository() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            latest_version_tag("marvin-test-no-such-git", tmp.path()),
            Version::new(0, 0, 0)
        );
    }

    fn listing() -> Vec<String> {
        ["artifact/1.0.0/vanilla/x.txt", "artifacts.md", "composer.json"]
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    #[test]
    fn test_without_dir_normalizes_the_excluded_path() {
        for dir in ["artifact", "./artifact", "artifact/", "./artifact/"] {
            assert_eq!(
                without_dir(listing(), Path::new(dir)),
                vec!["artifacts.md", "composer.json"],
                "excluding {}",
                dir
            );
        }
    }

    #[test]
    fn test_without_dir_keeps_everything_for_the_root() {
        assert_eq!(without_dir(listing(), Path::new(".")), listing());
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    #[ignore = "requires git"]
    fn test_list_files_excludes_artifact_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        git(dir, &["init", "-q"]);
        std::fs::create_dir_all(dir.join("artifact")).unwrap();
        std::fs::write(dir.join("composer.json"), "{}").unwrap();
        std::fs::write(dir.join("artifact/old.txt"), "x").unwrap();
        git(dir, &["add", "."]);

        let mut ctx = PipelineContext::new();
        let task = GitListFiles::new("git", PathArg::fixed(dir), "files").exclude_dir("artifact");
        assert_eq!(task.run(&mut ctx), 0);
        assert_eq!(ctx.get_string_list("files").unwrap(), vec!["composer.json"]);
    }
}
