//! Test: onboarding a fresh checkout

use crate::helpers::*;
use marvin::core::Event;
use marvin::execution::ExecutionEngine;
use std::fs;
use std::path::Path;

fn project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("composer.json"),
        r#"{
    "name": "drupal/my_project",
    "extra": {
        "installer-paths": {
            "web/core": ["type:drupal-core"]
        }
    }
}
"#,
    )
    .unwrap();
    fs::create_dir_all(tmp.path().join("web/sites")).unwrap();
    fs::write(
        tmp.path().join("web/sites/example.settings.local.php"),
        "<?php\n$settings['skip_permissions_hardening'] = TRUE;\n",
    )
    .unwrap();
    tmp
}

fn onboarding(root: &Path) -> ExecutionEngine {
    ExecutionEngine::with_defaults(environment(root, ""))
}

fn event() -> Event {
    Event::Onboarding {
        url: Some("http://my-project.localhost".to_string()),
    }
}

#[test]
fn test_onboarding_creates_local_files() {
    let tmp = project();
    let root = tmp.path();

    let report = onboarding(root).run(&event());
    assert_pipeline_completed(&report);
    assert_execution_order(
        &report,
        &[
            "marvin.onboarding.createRequiredDirs",
            "marvin.onboarding.settingsLocalPhp",
            "marvin.onboarding.drushLocalYml",
            "marvin.onboarding.hashSaltTxt",
        ],
    );

    for dir in [
        "web/sites/default/files",
        "sites/all/translations",
        "sites/default/config/sync",
        "sites/default/php_storage",
        "sites/default/private",
        "sites/default/temporary",
        "sites/default/backup",
    ] {
        assert!(root.join(dir).is_dir(), "{} is missing", dir);
    }

    assert_eq!(
        fs::read_to_string(root.join("web/sites/default/settings.local.php")).unwrap(),
        "<?php\n$settings['skip_permissions_hardening'] = TRUE;\n"
    );

    let salt = fs::read_to_string(root.join("sites/default/hash_salt.txt")).unwrap();
    assert!(salt.len() >= 64);
    assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_onboarding_is_idempotent() {
    let tmp = project();
    let root = tmp.path();

    assert_pipeline_completed(&onboarding(root).run(&event()));
    let salt = fs::read_to_string(root.join("sites/default/hash_salt.txt")).unwrap();
    fs::write(root.join("web/sites/default/settings.local.php"), "<?php\n// edited\n").unwrap();

    assert_pipeline_completed(&onboarding(root).run(&event()));
    assert_eq!(
        fs::read_to_string(root.join("sites/default/hash_salt.txt")).unwrap(),
        salt
    );
    assert_eq!(
        fs::read_to_string(root.join("web/sites/default/settings.local.php")).unwrap(),
        "<?php\n// edited\n"
    );
}

#[test]
fn test_drush_local_yml_points_at_the_local_uri() {
    let tmp = project();
    let root = tmp.path();
    fs::create_dir_all(root.join("drush")).unwrap();
    fs::write(
        root.join("drush/drush.yml"),
        "command:\n  options:\n    uri: 'http://example.com'\n",
    )
    .unwrap();

    assert_pipeline_completed(&onboarding(root).run(&event()));

    let local: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(root.join("drush/drush.local.yml")).unwrap()).unwrap();
    assert_eq!(local["command"]["options"]["uri"].as_str(), Some("http://my-project.localhost"));
}

#[test]
fn test_composer_post_install_runs_onboarding_in_dev_mode_only() {
    let tmp = project();
    let engine = onboarding(tmp.path());

    let dev = engine.plan(&Event::ComposerPostInstall { dev_mode: true });
    assert!(dev.step("marvin.onboarding.hashSaltTxt").is_some());

    let prod = engine.plan(&Event::ComposerPostInstall { dev_mode: false });
    assert!(prod.step("marvin.onboarding.hashSaltTxt").is_none());
}

#[test]
fn test_composer_post_install_without_a_repository_still_onboards() {
    let tmp = project();
    let root = tmp.path();
    assert!(!root.join(".git").exists());

    let report = onboarding(root).run(&Event::ComposerPostInstall { dev_mode: true });
    assert_pipeline_completed(&report);

    let executed = report.executed_steps();
    assert_eq!(executed.first().copied(), Some("marvin.gitHooks.deploy"));
    assert!(executed.contains(&"marvin.phpcs.config.installed_paths"));
    assert!(executed.contains(&"marvin.onboarding.hashSaltTxt"));
    assert!(root.join("sites/default/hash_salt.txt").is_file());
}

#[test]
fn test_template_projects_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("composer.json"),
        r#"{"name": "drupal/template", "scripts": {"post-create-project-cmd": "echo"}}"#,
    )
    .unwrap();

    let report = onboarding(tmp.path()).run(&event());
    assert_pipeline_completed(&report);
    assert_execution_order(&report, &["marvin.onboarding.skip"]);
    assert!(!tmp.path().join("sites").exists());
}
