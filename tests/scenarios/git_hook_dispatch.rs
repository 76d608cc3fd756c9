//! Test: Git hook pipelines and hook deployment

use crate::helpers::*;
use marvin::core::{Event, GitHook, PipelineContext};
use marvin::execution::ExecutionEngine;
use std::fs;
use std::path::Path;

const RULES: &str = r#"
marvin:
  git-hook:
    commit-msg:
      settings:
        rules:
          issueNumber:
            pattern: '^Issue #\d+ - \S'
            description: 'Subject line starts with "Issue #<number> - "'
          disabled:
            enabled: false
            pattern: 'never matches \d{99}'
            description: 'Disabled rule'
"#;

fn hook(hook: GitHook, args: &[&str]) -> Event {
    Event::GitHook {
        hook,
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

fn engine(root: &Path, yaml: &str) -> ExecutionEngine {
    ExecutionEngine::with_defaults(environment(root, yaml))
}

#[test]
fn test_hook_without_steps_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine(tmp.path(), "");

    let event = hook(GitHook::PostUpdate, &["refs/heads/main"]);
    assert!(engine.plan(&event).is_empty());

    let report = engine.run(&event);
    assert_pipeline_completed(&report);
    assert_eq!(report.pipeline_name, "marvin:git-hook:post-update");
    assert!(report.steps.is_empty());
}

#[test]
fn test_pre_commit_plan() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = engine(tmp.path(), "").plan(&hook(GitHook::PreCommit, &[]));
    assert_eq!(
        plan.execution_order(),
        vec!["marvin:lint:composer-validate", "marvin.lint.phpcs"]
    );
}

#[test]
fn test_commit_msg_validation() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let engine = engine(root, RULES);
    let message = root.join("COMMIT_EDITMSG");

    fs::write(&message, "Issue #42 - Add the thing\n\n# Please enter the commit message\n").unwrap();
    let event = hook(GitHook::CommitMsg, &[message.to_str().unwrap()]);
    let report = engine.run(&event);
    assert_pipeline_completed(&report);
    assert_execution_order(&report, &["marvin.commit-msg-validator"]);

    fs::write(&message, "fixed stuff\n").unwrap();
    let report = engine.run(&event);
    assert_pipeline_failed(&report, "marvin.commit-msg-validator", 1);
}

#[test]
fn test_commit_msg_relative_file_is_resolved_against_project_root() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git/COMMIT_EDITMSG"), "Issue #1 - Relative\n").unwrap();

    let report = engine(root, RULES).run(&hook(GitHook::CommitMsg, &[".git/COMMIT_EDITMSG"]));
    assert_pipeline_completed(&report);
}

#[test]
fn test_commit_msg_without_enabled_rules_adds_no_step() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = engine(tmp.path(), "").plan(&hook(GitHook::CommitMsg, &["COMMIT_EDITMSG"]));
    assert!(plan.is_empty());
}

#[test]
fn test_git_hooks_deploy_writes_every_hook() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let hooks_dir = root.join(".git/hooks");
    fs::create_dir_all(&hooks_dir).unwrap();
    fs::write(hooks_dir.join("pre-commit.sample"), "#!/bin/sh\n").unwrap();
    fs::write(hooks_dir.join(".gitkeep"), "").unwrap();

    let report = engine(root, "").run(&Event::GitHooksDeploy);
    assert_pipeline_completed(&report);
    assert_execution_order(&report, &["marvin.gitHooks.deploy"]);

    let scripts: Vec<String> = fs::read_dir(&hooks_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    assert_eq!(scripts.len(), GitHook::ALL.len());
    assert!(!hooks_dir.join("pre-commit.sample").exists());
    assert!(hooks_dir.join(".gitkeep").exists());

    let script = fs::read_to_string(hooks_dir.join("pre-commit")).unwrap();
    assert!(script.starts_with("#!/usr/bin/env sh\n"));
    assert!(script.contains("git-hook pre-commit \"$@\""));
    assert!(script.contains("/usr/local/bin/marvin"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(hooks_dir.join("commit-msg")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[test]
fn test_git_hooks_deploy_outside_a_repository_does_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let report = engine(tmp.path(), "").run(&Event::GitHooksDeploy);
    assert_pipeline_completed(&report);
    assert_execution_order(&report, &["marvin.gitHooks.deploy"]);
    assert!(!tmp.path().join(".git").exists());
}

#[test]
#[ignore = "requires git"]
fn test_post_checkout_lists_changed_files() {
    assert!(git_available());
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::write(root.join("README.md"), "readme\n").unwrap();
    init_repo(root);

    fs::create_dir_all(root.join("app")).unwrap();
    fs::write(root.join("app/composer.json"), "{}\n").unwrap();
    fs::write(root.join("package.json"), "{}\n").unwrap();
    git(root, &["add", "--all"]);
    git(root, &["commit", "--quiet", "-m", "Dependencies"]);

    let engine = engine(root, "");
    let event = hook(GitHook::PostCheckout, &["HEAD~1", "HEAD", "1"]);
    assert_eq!(
        engine.plan(&event).execution_order(),
        vec!["marvin:git-list-changed-files", "marvin:composer-install", "marvin:yarn-install"]
    );

    let mut ctx = PipelineContext::new();
    let report = engine.run_with_context(&event, &mut ctx);
    assert_pipeline_completed(&report);
    assert_eq!(
        ctx.get_string_list("changed.fileNames"),
        Some(vec!["app/composer.json".to_string(), "package.json".to_string()])
    );
}
