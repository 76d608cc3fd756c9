//! Test utility functions for marvin scenarios

#![allow(dead_code)]

use marvin::collaborators::{Collaborator, Environment};
use marvin::core::{
    Event, ExecutionStatus, ExitCode, MarvinConfig, PipelineContext, RunReport, StepRegistry,
};
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};

/// Names of the operations invoked so far, in call order
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// An operation that records `name` and returns `code`
pub fn recording(
    log: &CallLog,
    name: &str,
    code: ExitCode,
) -> impl Fn(&mut PipelineContext) -> ExitCode + Send + Sync + 'static {
    let log = Arc::clone(log);
    let name = name.to_string();
    move |_: &mut PipelineContext| {
        log.lock().unwrap().push(name.clone());
        code
    }
}

/// A collaborator that contributes recording steps to every event
pub struct Scripted {
    pub name: &'static str,
    pub steps: Vec<(&'static str, i32, ExitCode)>,
    pub log: CallLog,
}

impl Collaborator for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn on_event(&self, _event: &Event, _env: &Environment) -> StepRegistry {
        let mut registry = StepRegistry::new();
        for (name, weight, code) in &self.steps {
            registry.register(*name, *weight, recording(&self.log, name, *code));
        }
        registry
    }
}

/// Defaults overlaid with `yaml`
pub fn config(yaml: &str) -> MarvinConfig {
    let mut config = MarvinConfig::defaults();
    if !yaml.trim().is_empty() {
        config.merge(MarvinConfig::from_yaml(yaml).unwrap());
    }
    config.validate().unwrap();
    config
}

pub fn environment(root: &Path, yaml: &str) -> Environment {
    Environment::new(root, Arc::new(config(yaml))).with_executable("/usr/local/bin/marvin")
}

/// Assert that the run completed with exit code 0
pub fn assert_pipeline_completed(report: &RunReport) {
    assert_eq!(
        report.status,
        ExecutionStatus::Completed,
        "pipeline {} did not complete: {:?}",
        report.pipeline_name,
        report.failed_step()
    );
    assert_eq!(report.exit_code, 0);
}

/// Assert that the run failed in `step` with `code`
pub fn assert_pipeline_failed(report: &RunReport, step: &str, code: ExitCode) {
    assert_eq!(report.status, ExecutionStatus::Failed);
    assert_eq!(report.exit_code, code);
    assert_eq!(report.failed_step().map(|r| r.name.as_str()), Some(step));
}

/// Assert the invoked steps, in order
pub fn assert_execution_order(report: &RunReport, expected: &[&str]) {
    assert_eq!(report.executed_steps(), expected.to_vec());
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

/// A git repository with an initial commit of everything under `dir`
pub fn init_repo(dir: &Path) {
    git(dir, &["init", "--quiet"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["add", "--all"]);
    git(dir, &["commit", "--quiet", "--allow-empty", "-m", "Initial commit"]);
}
