//! Filesystem tasks

use super::{report, PathArg, TaskError};
use crate::core::{ExitCode, Operation, PipelineContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Create a directory, or empty it when it already exists
#[derive(Debug, Clone)]
pub struct PrepareDirectory {
    dir: PathArg,
}

impl PrepareDirectory {
    pub fn new(dir: PathArg) -> Self {
        Self { dir }
    }

    pub fn execute(&self, ctx: &PipelineContext) -> Result<(), TaskError> {
        let dir = self.dir.resolve(ctx)?;

        if !dir.exists() {
            debug!("Creating {}", dir.display());
            return fs::create_dir_all(&dir).map_err(|e| TaskError::io(&dir, e));
        }

        debug!("Emptying {}", dir.display());
        let entries = fs::read_dir(&dir).map_err(|e| TaskError::io(&dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| TaskError::io(&dir, e))?.path();
            remove_path(&path)?;
        }
        Ok(())
    }
}

impl Operation for PrepareDirectory {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        report("PrepareDirectory", self.execute(ctx))
    }

    fn describe(&self) -> String {
        format!("prepare {}", self.dir)
    }
}

/// Remove a file, symlink or directory tree
pub fn remove_path(path: &Path) -> Result<(), TaskError> {
    let meta = fs::symlink_metadata(path).map_err(|e| TaskError::io(path, e))?;
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| TaskError::io(path, e))
}

/// Copy a list of relative file names from one directory to another
///
/// The list is read from the context at run time.
#[derive(Debug, Clone)]
pub struct CopyFiles {
    src: PathArg,
    dst: PathArg,
    files_key: String,
}

impl CopyFiles {
    pub fn new(src: PathArg, dst: PathArg, files_key: impl Into<String>) -> Self {
        Self {
            src,
            dst,
            files_key: files_key.into(),
        }
    }

    pub fn execute(&self, ctx: &PipelineContext) -> Result<(), TaskError> {
        let src = self.src.resolve(ctx)?;
        let dst = self.dst.resolve(ctx)?;
        let files = ctx
            .get_string_list(&self.files_key)
            .ok_or_else(|| TaskError::MissingContext(self.files_key.clone()))?;

        let mut copied = 0;
        for file in &files {
            let from = src.join(file);
            if !from.is_file() {
                // Tracked but deleted in the working tree, or a submodule
                warn!("Skipping {}: not a regular file", from.display());
                continue;
            }

            let to = dst.join(file);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
            }
            fs::copy(&from, &to).map_err(|e| TaskError::io(&from, e))?;
            copied += 1;
        }

        debug!("Copied {} file(s) to {}", copied, dst.display());
        Ok(())
    }
}

impl Operation for CopyFiles {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        report("CopyFiles", self.execute(ctx))
    }

    fn describe(&self) -> String {
        format!("copy <{}> from {} to {}", self.files_key, self.src, self.dst)
    }
}

/// Create every listed directory that does not exist yet
#[derive(Debug, Clone)]
pub struct CreateDirectories {
    dirs: Vec<PathBuf>,
}

impl CreateDirectories {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn execute(&self) -> Result<(), TaskError> {
        for dir in &self.dirs {
            if !dir.is_dir() {
                debug!("Creating {}", dir.display());
                fs::create_dir_all(dir).map_err(|e| TaskError::io(dir, e))?;
            }
        }
        Ok(())
    }
}

impl Operation for CreateDirectories {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("CreateDirectories", self.execute())
    }

    fn describe(&self) -> String {
        format!("create {} directories", self.dirs.len())
    }
}
