//! Task primitives - reusable operations collaborators build steps from
//!
//! Each task gets its parameters at construction. A parameter that is only
//! known once earlier steps ran is a [`PathArg::Context`] and is read from the
//! context when the task runs.

pub mod commit_msg;
pub mod exec;
pub mod fs;
pub mod git;
pub mod git_hooks_deploy;
pub mod notify;
pub mod version;

pub use commit_msg::{CommitMsgRule, CommitMsgValidator};
pub use exec::ExecTask;
pub use fs::{CopyFiles, CreateDirectories, PrepareDirectory};
pub use git::{GitListChangedFiles, GitListFiles};
pub use git_hooks_deploy::GitHooksDeploy;
pub use notify::ChangedFilesNotification;
pub use version::BumpVersionNumber;

use crate::composer::ComposerError;
use crate::core::{ExitCode, PipelineContext};
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// Errors raised inside task primitives
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code}")]
    CommandFailed { command: String, code: ExitCode },

    #[error("Missing context value: {0}")]
    MissingContext(String),

    #[error(transparent)]
    Composer(#[from] ComposerError),

    #[error(transparent)]
    Version(#[from] version::VersionError),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Failed(String),
}

impl TaskError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code reported for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            TaskError::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Convert a task result into an exit code, logging the failure
pub fn report(task: &str, result: Result<(), TaskError>) -> ExitCode {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{}: {}", task, e);
            e.exit_code()
        }
    }
}

/// A path given up front or read from the context at run time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArg {
    Fixed(PathBuf),
    /// Context key holding the path as a string
    Context(String),
}

impl PathArg {
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        PathArg::Fixed(path.into())
    }

    pub fn context(key: impl Into<String>) -> Self {
        PathArg::Context(key.into())
    }

    /// Resolve against the current context
    pub fn resolve(&self, ctx: &PipelineContext) -> Result<PathBuf, TaskError> {
        match self {
            PathArg::Fixed(path) => Ok(path.clone()),
            PathArg::Context(key) => ctx
                .get_str(key)
                .map(PathBuf::from)
                .ok_or_else(|| TaskError::MissingContext(key.clone())),
        }
    }
}

impl std::fmt::Display for PathArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathArg::Fixed(path) => write!(f, "{}", path.display()),
            PathArg::Context(key) => write!(f, "<{}>", key),
        }
    }
}

/// Read a required string from the context
pub fn require_str<'a>(ctx: &'a PipelineContext, key: &str) -> Result<&'a str, TaskError> {
    ctx.get_str(key)
        .ok_or_else(|| TaskError::MissingContext(key.to_string()))
}
