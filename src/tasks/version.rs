//! Version numbers: parsing, bumping, Drupal formatting, writing

use super::{report, PathArg, TaskError};
use crate::composer::ComposerInfo;
use crate::core::{ExitCode, Operation, PipelineContext};
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Names accepted as the part of a version to bump
pub const VERSION_PARTS: [&str; 5] = ["major", "minor", "patch", "pre-release", "meta-data"];

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("Invalid version number '{input}': {source}")]
    Parse {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("Unknown version part '{0}'")]
    UnknownPart(String),
}

pub fn is_version_part(value: &str) -> bool {
    VERSION_PARTS.contains(&value)
}

/// Parse a version, allowing a leading `v`
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let trimmed = input.strip_prefix('v').unwrap_or(input);
    Version::parse(trimmed).map_err(|source| VersionError::Parse {
        input: input.to_string(),
        source,
    })
}

/// Increment one part of a version
pub fn bump(current: &Version, part: &str) -> Result<Version, VersionError> {
    let next = match part {
        "major" => Version::new(current.major + 1, 0, 0),
        "minor" => Version::new(current.major, current.minor + 1, 0),
        "patch" => Version::new(current.major, current.minor, current.patch + 1),
        "pre-release" => {
            if current.pre.is_empty() {
                let mut next = Version::new(current.major, current.minor, current.patch + 1);
                next.pre = prerelease("alpha1")?;
                next
            } else {
                let mut next = Version::new(current.major, current.minor, current.patch);
                next.pre = prerelease(&increment_trailing_number(current.pre.as_str()))?;
                next
            }
        }
        "meta-data" => {
            let mut next = current.clone();
            let build = if current.build.is_empty() {
                "build1".to_string()
            } else {
                increment_trailing_number(current.build.as_str())
            };
            next.build = BuildMetadata::new(&build).map_err(|source| VersionError::Parse {
                input: build.clone(),
                source,
            })?;
            next
        }
        other => return Err(VersionError::UnknownPart(other.to_string())),
    };

    Ok(next)
}

fn prerelease(value: &str) -> Result<Prerelease, VersionError> {
    Prerelease::new(value).map_err(|source| VersionError::Parse {
        input: value.to_string(),
        source,
    })
}

/// `beta1` -> `beta2`, `rc` -> `rc1`, `alpha.9` -> `alpha.10`
pub fn increment_trailing_number(value: &str) -> String {
    let digits = value
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .count();
    let (head, tail) = value.split_at(value.len() - digits);

    match tail.parse::<u64>() {
        Ok(number) => format!("{}{}", head, number + 1),
        Err(_) => format!("{}1", head),
    }
}

/// The version that follows `current`
///
/// `part_or_version` is either a part name or an exact version to use as is.
pub fn next_version(current: &Version, part_or_version: &str) -> Result<Version, VersionError> {
    if is_version_part(part_or_version) {
        bump(current, part_or_version)
    } else {
        parse_version(part_or_version)
    }
}

/// Drupal extension version, e.g. `8.x` + `1.2.0-beta1` -> `8.x-1.2-beta1`
pub fn drupal_version(core: &str, version: &Version) -> String {
    let mut result = format!("{}-{}.{}", core, version.major, version.minor);
    if !version.pre.is_empty() {
        result.push('-');
        result.push_str(version.pre.as_str());
    }
    result
}

/// Replace or append the `version:` line of an info.yml document
pub fn set_info_yml_version(content: &str, version: &str) -> Result<String, TaskError> {
    let line = format!("version: '{}'", version);
    let pattern = Regex::new(r"(?m)^version\s*:.*$")?;

    if pattern.is_match(content) {
        return Ok(pattern.replace(content, line.as_str()).into_owned());
    }

    let mut result = content.to_string();
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    result.push_str(&line);
    result.push('\n');
    Ok(result)
}

#[derive(Debug, Clone)]
enum VersionTarget {
    ComposerJson(PathArg),
    /// Context key listing extension directories
    InfoYml(String),
}

/// Write the next version number into composer.json or extension info files
#[derive(Debug, Clone)]
pub struct BumpVersionNumber {
    target: VersionTarget,
    version_key: String,
}

impl BumpVersionNumber {
    /// Set `version` in `<dir>/composer.json`
    pub fn composer_json(dir: PathArg, version_key: impl Into<String>) -> Self {
        Self {
            target: VersionTarget::ComposerJson(dir),
            version_key: version_key.into(),
        }
    }

    /// Set `version:` in every `*.info.yml` directly under the listed directories
    pub fn info_yml(dirs_key: impl Into<String>, version_key: impl Into<String>) -> Self {
        Self {
            target: VersionTarget::InfoYml(dirs_key.into()),
            version_key: version_key.into(),
        }
    }

    pub fn execute(&self, ctx: &PipelineContext) -> Result<(), TaskError> {
        let version = super::require_str(ctx, &self.version_key)?;

        match &self.target {
            VersionTarget::ComposerJson(dir) => {
                let dir = dir.resolve(ctx)?;
                let mut info = ComposerInfo::load(&dir)?;
                if let Some(json) = info.json_mut().as_object_mut() {
                    json.insert("version".to_string(), version.into());
                }
                info.write()?;
                debug!("composer.json version set to {}", version);
            }
            VersionTarget::InfoYml(dirs_key) => {
                let dirs = ctx
                    .get_string_list(dirs_key)
                    .ok_or_else(|| TaskError::MissingContext(dirs_key.clone()))?;
                for dir in dirs {
                    bump_info_files(Path::new(&dir), version)?;
                }
            }
        }

        Ok(())
    }
}

fn bump_info_files(dir: &Path, version: &str) -> Result<(), TaskError> {
    if !dir.exists() {
        debug!("{} does not exist, skipped", dir.display());
        return Ok(());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| TaskError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| TaskError::io(dir, e))?.path();
        let is_info = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".info.yml"));
        if !is_info || !path.is_file() {
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(|e| TaskError::io(&path, e))?;
        std::fs::write(&path, set_info_yml_version(&content, version)?)
            .map_err(|e| TaskError::io(&path, e))?;
        debug!("{} version set to {}", path.display(), version);
    }
    Ok(())
}

impl Operation for BumpVersionNumber {
    fn run(&self, ctx: &mut PipelineContext) -> ExitCode {
        report("BumpVersionNumber", self.execute(ctx))
    }

    fn describe(&self) -> String {
        match &self.target {
            VersionTarget::ComposerJson(dir) => {
                format!("set composer.json version in {} to <{}>", dir, self.version_key)
            }
            VersionTarget::InfoYml(key) => {
                format!("set info.yml versions under <{}> to <{}>", key, self.version_key)
            }
        }
    }
}
