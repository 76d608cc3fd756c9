//! Tell the developer when a checkout changed dependency manifests

use crate::core::{ExitCode, Operation, PipelineContext};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Warns with the command to run in every directory whose watched files changed
///
/// Never fails: a notification must not block a checkout.
#[derive(Debug, Clone)]
pub struct ChangedFilesNotification {
    files_key: String,
    watched: Vec<String>,
    command: String,
}

impl ChangedFilesNotification {
    pub fn new<I, S>(files_key: impl Into<String>, watched: I, command: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files_key: files_key.into(),
            watched: watched.into_iter().map(Into::into).collect(),
            command: command.into(),
        }
    }

    /// One `cd <dir> && <command>` line per affected directory, sorted
    pub fn instructions(&self, changed: &[String]) -> Vec<String> {
        let dirs: BTreeSet<String> = changed
            .iter()
            .map(Path::new)
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| self.watched.iter().any(|w| w == name))
            })
            .map(|path| match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
                _ => ".".to_string(),
            })
            .collect();

        dirs.into_iter()
            .map(|dir| format!("cd {} && {}", dir, self.command))
            .collect()
    }
}

impl Operation for ChangedFilesNotification {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        let changed = ctx.get_string_list(&self.files_key).unwrap_or_default();
        let instructions = self.instructions(&changed);

        if instructions.is_empty() {
            debug!("No changes in {}", self.watched.join(", "));
        } else {
            warn!(
                "{} changed, run:\n{}",
                self.watched.join(" or "),
                instructions.join("\n")
            );
        }
        0
    }

    fn describe(&self) -> String {
        format!("suggest `{}` when {} changed", self.command, self.watched.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn composer() -> ChangedFilesNotification {
        ChangedFilesNotification::new(
            "changed.fileNames",
            ["composer.json", "composer.lock"],
            "composer install",
        )
    }

    #[test]
    fn test_instructions_per_directory() {
        let changed = vec![
            "composer.lock".to_string(),
            "tools/phpcs/composer.json".to_string(),
            "tools/phpcs/composer.lock".to_string(),
            "docroot/index.php".to_string(),
        ];

        assert_eq!(
            composer().instructions(&changed),
            vec![
                "cd . && composer install".to_string(),
                "cd tools/phpcs && composer install".to_string(),
            ]
        );
    }

    #[test]
    fn test_always_succeeds() {
        let mut ctx = PipelineContext::new();
        assert_eq!(composer().run(&mut ctx), 0);

        ctx.set("changed.fileNames", json!(["composer.json"]));
        assert_eq!(composer().run(&mut ctx), 0);
    }
}
