//! Run an external command as a step

use super::{report, PathArg, TaskError};
use crate::core::{ExitCode, Operation, PipelineContext};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Runs a program with fixed arguments in a fixed or deferred directory
///
/// The child inherits stdout and stderr. A non-zero exit status becomes the
/// step's exit code.
#[derive(Debug, Clone)]
pub struct ExecTask {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathArg>,
    env: Vec<(String, String)>,
}

impl ExecTask {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: PathArg) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The command line as it would be typed
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn execute(&self, ctx: &PipelineContext) -> Result<(), TaskError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            let dir = dir.resolve(ctx)?;
            debug!("Working directory: {}", dir.display());
            command.current_dir(dir);
        }

        info!("Running: {}", self.command_line());
        let status = command.status().map_err(|source| TaskError::Spawn {
            command: self.command_line(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(TaskError::CommandFailed {
                command: self.command_line(),
                code: status.code().unwrap_or(1),
            })
        }
    }
}

impl Operation for ExecTask {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        report(&self.program, self.execute(ctx))
    }

    fn describe(&self) -> String {
        match &self.working_dir {
            Some(dir) => format!("{} (in {})", self.command_line(), dir),
            None => self.command_line(),
        }
    }
}

/// Run a program and capture its stdout
pub fn capture<I, S>(program: &str, args: I, dir: &Path) -> Result<String, TaskError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| TaskError::Spawn {
            command: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        debug!(
            "{} failed: {}",
            program,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(TaskError::CommandFailed {
            command: program.to_string(),
            code: output.status.code().unwrap_or(1),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
