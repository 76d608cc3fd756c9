//! Onboarding - prepare a fresh checkout for local development
//!
//! Every step leaves existing files alone, so running onboarding again is
//! harmless.

use super::{Collaborator, Environment};
use crate::composer::ComposerInfo;
use crate::core::{Event, ExitCode, Operation, PipelineContext, StepRegistry};
use crate::tasks::{git, report, CreateDirectories, TaskError};
use heck::ToKebabCase;
use rand::{Rng, RngCore};
use regex::Regex;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SITE_DIR: &str = "default";

const BEHAT_LOCAL_TEMPLATE: &str = "default:
  extensions:
    Behat\\MinkExtension:
      base_url: 'http://localhost'
";

pub struct OnboardingCollaborator;

impl Collaborator for OnboardingCollaborator {
    fn name(&self) -> &str {
        "onboarding"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let url = match event {
            Event::Onboarding { url } => url.clone(),
            Event::ComposerPostInstall { dev_mode: true } => None,
            _ => return StepRegistry::new(),
        };

        let composer = match ComposerInfo::load_or_default(env.project_root()) {
            Ok(info) => info,
            Err(e) => {
                warn!("Onboarding: {}", e);
                ComposerInfo::from_value(env.project_root(), json!({}))
            }
        };

        if composer.has_script("post-create-project-cmd") {
            return StepRegistry::new().with(
                "marvin.onboarding.skip",
                0,
                |_: &mut PipelineContext| {
                    info!("Onboarding is skipped, because this project is still in template phase");
                    0
                },
            );
        }

        let layout = SiteLayout::new(env.project_root(), &composer, SITE_DIR);
        let uri = url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| local_uri(composer.package_name()));

        let mut registry = StepRegistry::new()
            .with(
                "marvin.onboarding.createRequiredDirs",
                10,
                CreateDirectories::new(layout.required_dirs()),
            )
            .with(
                "marvin.onboarding.settingsLocalPhp",
                20,
                SettingsLocalPhp {
                    layout: layout.clone(),
                },
            );

        if env.project_root().join("tests").is_dir() {
            registry.register(
                "marvin.onboarding.behatLocalYml",
                30,
                BehatLocalYml {
                    project_root: env.project_root.clone(),
                    git: env.setting("gitExecutable", "git"),
                    uri: uri.clone(),
                },
            );
        }

        registry.register(
            "marvin.onboarding.drushLocalYml",
            40,
            DrushLocalYml {
                project_root: env.project_root.clone(),
                uri,
            },
        );
        registry.register(
            "marvin.onboarding.hashSaltTxt",
            50,
            HashSaltTxt {
                file: layout.project_site_dir().join("hash_salt.txt"),
            },
        );

        registry
    }
}

/// `http://<kebab-cased package name>.localhost`
pub fn local_uri(package_name: &str) -> String {
    format!("http://{}.localhost", package_name.to_kebab_case())
}

/// Where a site's files live
#[derive(Debug, Clone)]
pub struct SiteLayout {
    project_root: PathBuf,
    drupal_root: PathBuf,
    site_dir: String,
}

impl SiteLayout {
    pub fn new(project_root: &Path, composer: &ComposerInfo, site_dir: &str) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            drupal_root: project_root.join(composer.drupal_root_dir()),
            site_dir: site_dir.to_string(),
        }
    }

    /// `<drupalRoot>/sites/<site>`
    pub fn drupal_site_dir(&self) -> PathBuf {
        self.drupal_root.join("sites").join(&self.site_dir)
    }

    /// `<projectRoot>/sites/<site>`, for files kept outside the web root
    pub fn project_site_dir(&self) -> PathBuf {
        self.project_root.join("sites").join(&self.site_dir)
    }

    pub fn required_dirs(&self) -> Vec<PathBuf> {
        let site = self.project_site_dir();
        vec![
            self.drupal_site_dir().join("files"),
            self.project_root.join("sites/all/translations"),
            site.join("config/sync"),
            site.join("php_storage"),
            site.join("private"),
            site.join("temporary"),
            site.join("backup"),
        ]
    }

    /// Candidate sources for settings.local.php, in preference order
    pub fn settings_local_examples(&self) -> Vec<PathBuf> {
        let site = self.drupal_site_dir();
        vec![
            site.join("settings.local.example.php"),
            site.join("example.settings.local.php"),
            self.drupal_root.join("sites/example.settings.local.php"),
        ]
    }
}

#[derive(Debug, Clone)]
struct SettingsLocalPhp {
    layout: SiteLayout,
}

impl SettingsLocalPhp {
    fn execute(&self) -> Result<(), TaskError> {
        let dst = self.layout.drupal_site_dir().join("settings.local.php");
        if dst.exists() {
            debug!("File {} already exists", dst.display());
            return Ok(());
        }

        let Some(src) = self
            .layout
            .settings_local_examples()
            .into_iter()
            .find(|p| p.is_file())
        else {
            debug!("There is no source for settings.local.php");
            return Ok(());
        };

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        fs::copy(&src, &dst).map_err(|e| TaskError::io(&src, e))?;
        info!("Created {}", dst.display());
        Ok(())
    }
}

impl Operation for SettingsLocalPhp {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("settings.local.php", self.execute())
    }

    fn describe(&self) -> String {
        "create settings.local.php from an example".to_string()
    }
}

#[derive(Debug, Clone)]
struct BehatLocalYml {
    project_root: PathBuf,
    git: String,
    uri: String,
}

impl BehatLocalYml {
    fn execute(&self) -> Result<(), TaskError> {
        let pathspecs = ["behat.yml".to_string(), "*/behat.yml".to_string()];
        let files = git::list_files(&self.git, &self.project_root, &pathspecs)?;

        for file in files {
            let behat_dir = self
                .project_root
                .join(file)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.project_root.clone());
            self.write_local(&behat_dir)?;
        }
        Ok(())
    }

    fn write_local(&self, behat_dir: &Path) -> Result<(), TaskError> {
        let local = behat_dir.join("behat.local.yml");
        if local.exists() {
            debug!("File {} already exists", local.display());
            return Ok(());
        }

        let example = behat_dir.join("behat.local.example.yml");
        let template = if example.is_file() {
            fs::read_to_string(&example).map_err(|e| TaskError::io(&example, e))?
        } else {
            BEHAT_LOCAL_TEMPLATE.to_string()
        };

        let content = set_base_url(&template, &self.uri)?;
        fs::write(&local, content).map_err(|e| TaskError::io(&local, e))?;
        info!("Created {}", local.display());
        Ok(())
    }
}

impl Operation for BehatLocalYml {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("behat.local.yml", self.execute())
    }

    fn describe(&self) -> String {
        format!("create behat.local.yml files with base_url {}", self.uri)
    }
}

/// Point every indented `base_url:` key at `uri`
pub fn set_base_url(content: &str, uri: &str) -> Result<String, TaskError> {
    let pattern = Regex::new(r"(?m)^([ \t]+base_url:).*$")?;
    let replacement = format!("${{1}} {}", yaml_single_quoted(uri).replace('$', "$$"));
    Ok(pattern.replace_all(content, replacement.as_str()).into_owned())
}

/// Render a YAML single-quoted scalar
pub fn yaml_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone)]
struct DrushLocalYml {
    project_root: PathBuf,
    uri: String,
}

impl DrushLocalYml {
    fn execute(&self) -> Result<(), TaskError> {
        let drush_dir = self.project_root.join("drush");
        let local = drush_dir.join("drush.local.yml");
        if local.exists() {
            debug!("File {} already exists", local.display());
            return Ok(());
        }

        let example = drush_dir.join("drush.local.example.yml");
        if example.is_file() {
            fs::copy(&example, &local).map_err(|e| TaskError::io(&example, e))?;
            info!("Created {}", local.display());
            return Ok(());
        }

        let base = drush_dir.join("drush.yml");
        if !base.is_file() {
            return Ok(());
        }

        let content = fs::read_to_string(&base).map_err(|e| TaskError::io(&base, e))?;
        let parsed: Value = serde_yaml::from_str(&content)
            .map_err(|e| TaskError::Failed(format!("{}: {}", base.display(), e)))?;
        if parsed.pointer("/command/options/uri").and_then(Value::as_str) == Some(self.uri.as_str()) {
            return Ok(());
        }

        let local_content = json!({"command": {"options": {"uri": self.uri}}});
        let yaml = serde_yaml::to_string(&local_content)
            .map_err(|e| TaskError::Failed(format!("{}: {}", local.display(), e)))?;
        fs::write(&local, yaml).map_err(|e| TaskError::io(&local, e))?;
        info!("Created {}", local.display());
        Ok(())
    }
}

impl Operation for DrushLocalYml {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("drush.local.yml", self.execute())
    }

    fn describe(&self) -> String {
        format!("create drush/drush.local.yml with uri {}", self.uri)
    }
}

#[derive(Debug, Clone)]
struct HashSaltTxt {
    file: PathBuf,
}

/// Hex encoding of 32 to 64 random bytes
pub fn generate_hash_salt() -> String {
    let mut rng = rand::thread_rng();
    let mut bytes = vec![0u8; rng.gen_range(32..=64)];
    rng.fill_bytes(&mut bytes);
    hex::encode(&bytes)
}

impl HashSaltTxt {
    fn execute(&self) -> Result<(), TaskError> {
        if self.file.exists() {
            debug!("File {} already exists", self.file.display());
            return Ok(());
        }
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        fs::write(&self.file, generate_hash_salt()).map_err(|e| TaskError::io(&self.file, e))
    }
}

impl Operation for HashSaltTxt {
    fn run(&self, _ctx: &mut PipelineContext) -> ExitCode {
        report("hash_salt.txt", self.execute())
    }

    fn describe(&self) -> String {
        format!("write {}", self.file.display())
    }
}
