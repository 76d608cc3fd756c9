//! Vanilla release artifact
//!
//! Copies the tracked files of the project into
//! `<artifactDir>/<next version>/vanilla`, makes the copy installable on its
//! own and stamps the new version into composer.json and every custom
//! extension.

use super::{ArtifactType, Collaborator, Environment};
use crate::composer::ComposerInfo;
use crate::core::{Event, PipelineContext, StepRegistry};
use crate::tasks::version::{drupal_version, next_version, parse_version};
use crate::tasks::{
    git, report, require_str, BumpVersionNumber, CopyFiles, ExecTask, GitListFiles, PathArg,
    PrepareDirectory, TaskError,
};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const ARTIFACT_TYPE: &str = "vanilla";
pub const PROJECT_TYPE: &str = "product";

pub const CTX_CORE_VERSION: &str = "coreVersion";
pub const CTX_ARTIFACT_TYPE: &str = "artifactType";
pub const CTX_VERSION_PART: &str = "versionPartToBump";
pub const CTX_SRC_DIR: &str = "srcDir";
pub const CTX_OLD_DRUPAL_ROOT: &str = "oldDrupalRootDir";
pub const CTX_NEW_DRUPAL_ROOT: &str = "newDrupalRootDir";
pub const CTX_LATEST_VERSION: &str = "latestVersionNumber.semver";
pub const CTX_NEXT_SEMVER: &str = "nextVersionNumber.semver";
pub const CTX_NEXT_DRUPAL: &str = "nextVersionNumber.drupal";
pub const CTX_BUILD_DIR: &str = "buildDir";
pub const CTX_FILES: &str = "files";
pub const CTX_GITIGNORE: &str = ".gitignore";
pub const CTX_CUSTOM_EXTENSION_DIRS: &str = "customExtensionDirs";

pub struct VanillaArtifactCollaborator;

impl Collaborator for VanillaArtifactCollaborator {
    fn name(&self) -> &str {
        "artifact.vanilla"
    }

    fn artifact_types(&self, project_type: &str) -> Vec<ArtifactType> {
        if project_type == PROJECT_TYPE {
            vec![ArtifactType::new(ARTIFACT_TYPE, "Vanilla", "Not customized")]
        } else {
            Vec::new()
        }
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        match event {
            Event::ArtifactBuild {
                artifact_type,
                version_bump,
            } if artifact_type == ARTIFACT_TYPE
                && env.setting("projectType", PROJECT_TYPE) == PROJECT_TYPE =>
            {
                build_steps(env, version_bump)
            }
            _ => StepRegistry::new(),
        }
    }
}

fn build_steps(env: &Environment, version_bump: &str) -> StepRegistry {
    let src_dir = env.project_root.clone();
    let git = env.setting("gitExecutable", "git");
    let artifact_setting = env.setting("artifactDir", "artifact");
    let artifact_dir = src_dir.join(&artifact_setting);

    let init = {
        let core = env.setting("coreVersion", "8.x");
        let part = version_bump.to_string();
        let src = src_dir.display().to_string();
        let drupal_root_setting = env.setting("drupalRootDir", "");
        let src_dir = src_dir.clone();
        move |ctx: &mut PipelineContext| {
            ctx.set(CTX_CORE_VERSION, core.as_str());
            ctx.set(CTX_ARTIFACT_TYPE, ARTIFACT_TYPE);
            ctx.set(CTX_VERSION_PART, part.as_str());
            ctx.set(CTX_SRC_DIR, src.as_str());
            report("initStateData", init_drupal_roots(ctx, &src_dir, &drupal_root_setting))
        }
    };

    let detect = {
        let git = git.clone();
        let src_dir = src_dir.clone();
        move |ctx: &mut PipelineContext| {
            let latest = git::latest_version_tag(&git, &src_dir);
            debug!("Latest version number: {}", latest);
            ctx.set(CTX_LATEST_VERSION, latest.to_string());
            0
        }
    };

    let build_dir = {
        let artifact_dir = artifact_dir.clone();
        move |ctx: &mut PipelineContext| {
            report("composeBuildDirPath", compose_build_dir(ctx, &artifact_dir))
        }
    };

    let mut collect_files = GitListFiles::new(git.as_str(), PathArg::fixed(&src_dir), CTX_FILES);
    if Path::new(&artifact_setting).is_relative() {
        collect_files = collect_files.exclude_dir(artifact_setting.as_str());
    }

    let relative_paths = {
        let src_dir = src_dir.clone();
        move |ctx: &mut PipelineContext| {
            report(
                "resolveRelativePackagePaths",
                resolve_relative_package_paths(ctx, &src_dir),
            )
        }
    };

    let extension_dirs = {
        let git = git.clone();
        let src_dir = src_dir.clone();
        move |ctx: &mut PipelineContext| {
            report(
                "collectCustomExtensionDirs",
                collect_custom_extension_dirs(ctx, &git, &src_dir),
            )
        }
    };

    StepRegistry::new()
        .with("marvin.initStateData", -240, init)
        .with("marvin.detectLatestVersionNumber", -230, detect)
        .with(
            "marvin.composeNextVersionNumber",
            -220,
            |ctx: &mut PipelineContext| report("composeNextVersionNumber", compose_next_version(ctx)),
        )
        .with("marvin.composeBuildDirPath", -210, build_dir)
        .with(
            "marvin.prepareDirectory",
            -200,
            PrepareDirectory::new(PathArg::context(CTX_BUILD_DIR)),
        )
        .with("marvin.collectFiles", -190, collect_files)
        .with(
            "marvin.copyFiles",
            -180,
            CopyFiles::new(PathArg::fixed(&src_dir), PathArg::context(CTX_BUILD_DIR), CTX_FILES),
        )
        .with("marvin_product.resolveRelativePackagePaths", -170, relative_paths)
        .with(
            "marvin_product.moveDocroot",
            -160,
            |ctx: &mut PipelineContext| report("moveDocroot", move_docroot(ctx)),
        )
        .with(
            "marvin_product.composerUpdate",
            -150,
            ExecTask::new(env.setting("composerExecutable", "composer"))
                .args(["update", "--no-dev", "--no-interaction", "--no-progress", "--lock"])
                .current_dir(PathArg::context(CTX_BUILD_DIR)),
        )
        .with(
            "marvin_product.gitignoreEntries",
            -140,
            |ctx: &mut PipelineContext| report("gitignoreEntries", gitignore_entries(ctx)),
        )
        .with(
            "marvin_product.gitignoreDump",
            -130,
            |ctx: &mut PipelineContext| report("gitignoreDump", gitignore_dump(ctx)),
        )
        .with(
            "marvin.bumpVersionNumber.root",
            200,
            BumpVersionNumber::composer_json(PathArg::context(CTX_BUILD_DIR), CTX_NEXT_DRUPAL),
        )
        .with("marvin.collectCustomExtensionDirs", 210, extension_dirs)
        .with(
            "marvin.bumpVersionNumber.extensions",
            220,
            BumpVersionNumber::info_yml(CTX_CUSTOM_EXTENSION_DIRS, CTX_NEXT_DRUPAL),
        )
}

fn init_drupal_roots(ctx: &mut PipelineContext, src_dir: &Path, configured: &str) -> Result<(), TaskError> {
    let old_root = ComposerInfo::load(src_dir)?.drupal_root_dir();
    let new_root = match configured.trim_matches('/') {
        "" => old_root.clone(),
        configured => configured.to_string(),
    };
    ctx.set(CTX_OLD_DRUPAL_ROOT, old_root);
    ctx.set(CTX_NEW_DRUPAL_ROOT, new_root);
    Ok(())
}

/// Write `nextVersionNumber.semver` and `nextVersionNumber.drupal`
pub fn compose_next_version(ctx: &mut PipelineContext) -> Result<(), TaskError> {
    let latest = parse_version(ctx.get_str(CTX_LATEST_VERSION).unwrap_or("0.0.0"))?;
    let part = ctx.get_str(CTX_VERSION_PART).unwrap_or("minor").to_string();
    let core = ctx.get_str(CTX_CORE_VERSION).unwrap_or("8.x").to_string();

    let next = next_version(&latest, &part)?;
    debug!("Next version number: {} ({} of {})", next, part, latest);

    ctx.set(CTX_NEXT_SEMVER, next.to_string());
    ctx.set(CTX_NEXT_DRUPAL, drupal_version(&core, &next));
    Ok(())
}

/// `buildDir = <artifactDir>/<next version>/<artifact type>`
pub fn compose_build_dir(ctx: &mut PipelineContext, artifact_dir: &Path) -> Result<(), TaskError> {
    let version = require_str(ctx, CTX_NEXT_SEMVER)?;
    let artifact_type = require_str(ctx, CTX_ARTIFACT_TYPE)?;
    let build_dir = artifact_dir.join(version).join(artifact_type);
    ctx.set(CTX_BUILD_DIR, build_dir.display().to_string());
    Ok(())
}

/// Path of `target` as seen from `base`
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    fn significant(path: &Path) -> Vec<Component<'_>> {
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    let target = significant(target);
    let base = significant(base);
    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Point `path` repositories of the copied composer.json back at the source
pub fn resolve_relative_package_paths(ctx: &mut PipelineContext, src_dir: &Path) -> Result<(), TaskError> {
    let build_dir = PathBuf::from(require_str(ctx, CTX_BUILD_DIR)?);
    let mut info = ComposerInfo::load(&build_dir)?;
    let relative = relative_path(src_dir, &build_dir);

    let repositories: Vec<&mut Value> = match info.json_mut().get_mut("repositories") {
        Some(Value::Array(items)) => items.iter_mut().collect(),
        Some(Value::Object(items)) => items.values_mut().collect(),
        _ => Vec::new(),
    };

    let mut changed = false;
    for repo in repositories {
        if repo.get("type").and_then(Value::as_str) != Some("path") {
            continue;
        }
        let Some(url) = repo.get("url").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        if Path::new(&url).is_absolute() {
            continue;
        }

        let new_url = format!("{}/{}", relative.display(), url);
        debug!("Repository path {} => {}", url, new_url);
        repo["url"] = Value::String(new_url);
        repo["options"]["symlink"] = Value::Bool(false);
        changed = true;
    }

    if changed {
        info.write()?;
    }
    Ok(())
}

/// Rename the Drupal root inside the build when a different one is configured
pub fn move_docroot(ctx: &mut PipelineContext) -> Result<(), TaskError> {
    let build_dir = PathBuf::from(require_str(ctx, CTX_BUILD_DIR)?);
    let old_root = require_str(ctx, CTX_OLD_DRUPAL_ROOT)?.to_string();
    let new_root = require_str(ctx, CTX_NEW_DRUPAL_ROOT)?.to_string();

    if old_root == new_root {
        debug!("Drupal root stays {}", old_root);
        return Ok(());
    }
    debug!("Moving Drupal root from {} to {}", old_root, new_root);

    let from = build_dir.join(&old_root);
    let to = build_dir.join(&new_root);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::rename(&from, &to).map_err(|e| TaskError::io(&from, e))?;

    let drush_yml = build_dir.join("drush").join("drush.yml");
    if drush_yml.is_file() {
        let content = fs::read_to_string(&drush_yml).map_err(|e| TaskError::io(&drush_yml, e))?;
        let pattern = |root: &str| format!("'${{drush.vendor-dir}}/../{}'", root);
        let patched = content.replace(&pattern(&old_root), &pattern(&new_root));
        fs::write(&drush_yml, patched).map_err(|e| TaskError::io(&drush_yml, e))?;
    }

    let mut info = ComposerInfo::load(&build_dir)?;
    if let Some(Value::Object(paths)) = info.json_mut().pointer_mut("/extra/installer-paths") {
        let old_prefix = format!("{}/", old_root);
        let rewritten: Map<String, Value> = std::mem::take(paths)
            .into_iter()
            .map(|(path, conditions)| match path.strip_prefix(&old_prefix) {
                Some(rest) => (format!("{}/{}", new_root, rest), conditions),
                None => (path, conditions),
            })
            .collect();
        *paths = rewritten;
    }
    info.write()?;
    Ok(())
}

/// Entries of the artifact's .gitignore, with ordering weights
pub fn gitignore_entries(ctx: &mut PipelineContext) -> Result<(), TaskError> {
    let drupal_root = require_str(ctx, CTX_NEW_DRUPAL_ROOT)?.to_string();
    let entries = [
        format!("/{}/sites/*/files/", drupal_root),
        "/sites/*/backup/".to_string(),
        "/sites/*/php_storage/".to_string(),
        "/sites/*/private/".to_string(),
        "/sites/*/hash_salt.txt".to_string(),
    ];

    let map: Map<String, Value> = entries
        .into_iter()
        .zip(1..)
        .map(|(entry, weight)| (entry, Value::from(weight)))
        .collect();
    ctx.set(CTX_GITIGNORE, Value::Object(map));
    Ok(())
}

/// Render .gitignore content, entries sorted by weight
pub fn render_gitignore(entries: &Map<String, Value>) -> String {
    let mut sorted: Vec<(&String, i64)> = entries
        .iter()
        .map(|(entry, weight)| (entry, weight.as_i64().unwrap_or(0)))
        .collect();
    sorted.sort_by_key(|(_, weight)| *weight);

    let mut content = sorted
        .into_iter()
        .map(|(entry, _)| entry.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    content
}

pub fn gitignore_dump(ctx: &mut PipelineContext) -> Result<(), TaskError> {
    let build_dir = PathBuf::from(require_str(ctx, CTX_BUILD_DIR)?);
    let entries = ctx
        .get(CTX_GITIGNORE)
        .and_then(Value::as_object)
        .ok_or_else(|| TaskError::MissingContext(CTX_GITIGNORE.to_string()))?;

    let file = build_dir.join(".gitignore");
    fs::write(&file, render_gitignore(entries)).map_err(|e| TaskError::io(&file, e))
}

/// Directories of tracked custom extensions, relocated into the build
pub fn collect_custom_extension_dirs(ctx: &mut PipelineContext, git: &str, src_dir: &Path) -> Result<(), TaskError> {
    let build_dir = PathBuf::from(require_str(ctx, CTX_BUILD_DIR)?);
    let old_root = require_str(ctx, CTX_OLD_DRUPAL_ROOT)?.to_string();
    let new_root = require_str(ctx, CTX_NEW_DRUPAL_ROOT)?.to_string();

    let pathspecs: Vec<String> = ["modules", "profiles", "themes"]
        .iter()
        .map(|kind| format!("{}/{}/custom/*/*.info.yml", old_root, kind))
        .collect();
    let files = git::list_files(git, src_dir, &pathspecs)?;

    let dirs: Vec<String> = files
        .iter()
        .filter_map(|file| Path::new(file).parent())
        .map(|dir| {
            let relocated = dir
                .strip_prefix(&old_root)
                .map(|rest| Path::new(&new_root).join(rest))
                .unwrap_or_else(|_| dir.to_path_buf());
            build_dir.join(relocated).display().to_string()
        })
        .collect();

    debug!("{} custom extension(s)", dirs.len());
    ctx.set(CTX_CUSTOM_EXTENSION_DIRS, Value::from(dirs));
    Ok(())
}
