//! Commit message validation against configured rules

use super::{report, TaskError};
use crate::core::{ExitCode, Operation, PipelineContext};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// One named rule a commit message has to match
#[derive(Debug, Clone, Deserialize)]
pub struct CommitMsgRule {
    #[serde(skip)]
    pub name: String,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    pub pattern: String,

    #[serde(default)]
    pub description: String,
}

fn enabled_by_default() -> bool {
    true
}

impl CommitMsgRule {
    /// Parse the `name -> rule` mapping from configuration, in mapping order
    ///
    /// Entries that are not rule objects are skipped.
    pub fn from_config(rules: &Value) -> Vec<CommitMsgRule> {
        let Some(map) = rules.as_object() else {
            return Vec::new();
        };

        map.iter()
            .filter_map(|(name, raw)| match CommitMsgRule::deserialize(raw) {
                Ok(mut rule) => {
                    rule.name = name.clone();
                    Some(rule)
                }
                Err(e) => {
                    debug!("Ignoring commit-msg rule {}: {}", name, e);
                    None
                }
            })
            .collect()
    }
}

/// Strip `#` comment lines and surrounding whitespace from a commit message
pub fn clean_message(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Validates the message file Git hands to the commit-msg hook
#[derive(Debug, Clone)]
pub struct CommitMsgValidator {
    file: PathBuf,
    rules: Vec<CommitMsgRule>,
}

impl CommitMsgValidator {
    /// `file` is resolved against `project_root` when it is relative and
    /// does not exist as given
    pub fn new(project_root: &Path, file: impl Into<PathBuf>, rules: Vec<CommitMsgRule>) -> Self {
        let file = file.into();
        let file = if file.is_relative() && !file.exists() {
            project_root.join(file)
        } else {
            file
        };

        Self {
            file,
            rules: rules.into_iter().filter(|r| r.enabled).collect(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn rules(&self) -> &[CommitMsgRule] {
        &self.rules
    }

    /// Names of the rules `message` violates
    pub fn violations(&self, message: &str) -> Result<Vec<&CommitMsgRule>, TaskError> {
        let mut failed = Vec::new();
        for rule in &self.rules {
            let regex = Regex::new(&rule.pattern)?;
            if !regex.is_match(message) {
                failed.push(rule);
            }
        }
        Ok(failed)
    }

    pub fn execute(&self) -> Result<(), TaskError> {
        let raw = std::fs::read_to_string(&self.file).map_err(|e| TaskError::io(&self.file, e))?;
        let message = clean_message(&raw);

        let violations = self.violations(&message)?;
        if violations.is_empty() {
            debug!("Commit message passed {} rule(s)", self.rules.len());
            return Ok(());
        }

        for rule in &violations {
            let description = if rule.description.is_empty() {
                &rule.pattern
            } else {
                &rule.description
            };
            error!("Commit message rule '{}' failed: {}", rule.name, description);
        }

        Err(TaskError::Failed(format!(
            "commit message violates {} rule(s)",
            violations.len()
        )))
    }
}

impl Operation for CommitMsgValidator {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("CommitMsgValidator", self.execute())
    }

    fn describe(&self) -> String {
        format!("validate {} against {} rule(s)", self.file.display(), self.rules.len())
    }
}
