//! Test: building the vanilla release artifact

use crate::helpers::*;
use marvin::core::Event;
use marvin::execution::ExecutionEngine;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn build_event(version_bump: &str) -> Event {
    Event::ArtifactBuild {
        artifact_type: "vanilla".to_string(),
        version_bump: version_bump.to_string(),
    }
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_artifact_types_depend_on_project_type() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = ExecutionEngine::with_defaults(environment(tmp.path(), ""));
    let types = engine.artifact_types("product");
    assert_eq!(types.keys().collect::<Vec<_>>(), vec!["vanilla"]);
    assert_eq!(types["vanilla"].label, "Vanilla");

    assert!(engine.artifact_types("library").is_empty());
}

#[test]
fn test_build_plan() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = ExecutionEngine::with_defaults(environment(tmp.path(), ""));
    let plan = engine.plan(&build_event("minor"));

    assert_eq!(plan.name, "marvin:artifact:build:vanilla");
    assert_eq!(plan.len(), 15);
    assert_eq!(plan.execution_order().first(), Some(&"marvin.initStateData"));
    assert_eq!(plan.execution_order().last(), Some(&"marvin.bumpVersionNumber.extensions"));

    let other = engine.plan(&Event::ArtifactBuild {
        artifact_type: "docker".to_string(),
        version_bump: "minor".to_string(),
    });
    assert!(other.is_empty());
}

#[test]
#[ignore = "requires git"]
fn test_vanilla_build() {
    assert!(git_available());
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    write(
        root,
        "composer.json",
        r#"{
    "name": "drupal/site",
    "repositories": [
        {"type": "path", "url": "packages/foo"}
    ],
    "extra": {
        "installer-paths": {
            "docroot/core": ["type:drupal-core"],
            "docroot/modules/contrib/{$name}": ["type:drupal-module"]
        }
    }
}
"#,
    );
    write(root, "docroot/index.php", "<?php\n");
    write(root, "docroot/modules/custom/foo/foo.info.yml", "name: Foo\ntype: module\ncore: 8.x\n");
    write(root, "drush/drush.yml", "options:\n  root: '${drush.vendor-dir}/../docroot'\n");
    write(root, "packages/foo/composer.json", "{\"name\": \"drupal/foo\"}\n");
    init_repo(root);
    git(root, &["tag", "v1.2.0"]);
    write(root, "untracked.txt", "not in the artifact\n");

    let engine = ExecutionEngine::with_defaults(environment(
        root,
        "marvin:\n  drupalRootDir: web\n  composerExecutable: 'true'\n",
    ));
    let report = engine.run(&build_event("minor"));
    assert_pipeline_completed(&report);

    let build = root.join("artifact/1.3.0/vanilla");
    assert!(build.join("web/index.php").is_file());
    assert!(!build.join("docroot").exists());
    assert!(!build.join("untracked.txt").exists());

    let composer: Value =
        serde_json::from_str(&fs::read_to_string(build.join("composer.json")).unwrap()).unwrap();
    assert_eq!(composer["version"], "8.x-1.3");
    assert_eq!(composer["repositories"][0]["url"], "../../../packages/foo");
    assert_eq!(composer["repositories"][0]["options"]["symlink"], false);
    assert!(composer["extra"]["installer-paths"].get("web/core").is_some());

    assert_eq!(
        fs::read_to_string(build.join("drush/drush.yml")).unwrap(),
        "options:\n  root: '${drush.vendor-dir}/../web'\n"
    );
    assert!(fs::read_to_string(build.join("web/modules/custom/foo/foo.info.yml"))
        .unwrap()
        .contains("version: '8.x-1.3'"));
    assert!(fs::read_to_string(build.join(".gitignore"))
        .unwrap()
        .starts_with("/web/sites/*/files/\n"));

    // The source tree is left alone
    assert!(fs::read_to_string(root.join("docroot/modules/custom/foo/foo.info.yml"))
        .unwrap()
        .ends_with("core: 8.x\n"));
}
