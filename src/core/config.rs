//! Marvin configuration from YAML

use crate::core::registry::CollisionPolicy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the project-level configuration
pub const PROJECT_CONFIG_FILE: &str = "marvin.yml";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid define '{0}', expected key=value")]
    InvalidDefine(String),

    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },
}

/// Read-only access to configuration values by dotted key
///
/// Collaborators receive this capability explicitly and resolve the values
/// their operations need when they build them.
pub trait ConfigLookup: Send + Sync {
    /// Get the value at a dotted key such as `marvin.artifactDir`
    fn get(&self, key: &str) -> Option<Value>;

    /// Get a value, falling back to `default` when missing or null
    fn get_or(&self, key: &str, default: Value) -> Value {
        match self.get(key) {
            Some(Value::Null) | None => default,
            Some(value) => value,
        }
    }

    /// Get a value rendered as a string
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }
}

/// Where to look for configuration
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Project root; `<root>/marvin.yml` is read when present
    pub project_root: PathBuf,

    /// Explicit config file, which must exist
    pub config_file: Option<PathBuf>,

    /// `key=value` overrides applied last
    pub defines: Vec<String>,

    /// Whether to read the per-user config file
    pub include_user_config: bool,
}

/// Layered configuration tree
#[derive(Debug, Clone)]
pub struct MarvinConfig {
    root: Value,
}

impl MarvinConfig {
    /// Built-in defaults
    pub fn defaults() -> Self {
        Self {
            root: json!({
                "marvin": {
                    "projectType": "product",
                    "environment": "local",
                    "artifactDir": "artifact",
                    "coreVersion": "8.x",
                    "drupalRootDir": "",
                    "composerExecutable": "composer",
                    "gitExecutable": "git",
                    "yarnExecutable": "yarn",
                    "npmExecutable": "npm",
                    "phpcsExecutable": "vendor/bin/phpcs",
                    "phpunitExecutable": "vendor/bin/phpunit",
                    "drushExecutable": "vendor/bin/drush",
                    "phpcs": {
                        "installedPaths": [],
                    },
                    "migrate": {},
                    "phpunit": {
                        "testSuite": "",
                    },
                    "collisionPolicy": "replace",
                    "state": {},
                    "git-hook": {
                        "commit-msg": {
                            "settings": {
                                "rules": {},
                            },
                        },
                    },
                },
            }),
        }
    }

    /// An empty configuration
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Parse a configuration layer from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(yaml)?;
        let root = match root {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Ok(Self { root })
    }

    /// Load a configuration layer from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("marvin").join(PROJECT_CONFIG_FILE))
    }

    /// Build the effective configuration: defaults, user file, project file,
    /// explicit file, then defines
    pub fn load(options: &LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();

        if options.include_user_config {
            if let Some(path) = Self::user_config_path().filter(|p| p.is_file()) {
                tracing::debug!("Loading user config {}", path.display());
                config.merge(Self::from_file(path)?);
            }
        }

        let project_file = options.project_root.join(PROJECT_CONFIG_FILE);
        if project_file.is_file() {
            tracing::debug!("Loading project config {}", project_file.display());
            config.merge(Self::from_file(project_file)?);
        }

        if let Some(path) = &options.config_file {
            tracing::debug!("Loading config {}", path.display());
            config.merge(Self::from_file(path)?);
        }

        for define in &options.defines {
            config.define(define)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Deep-merge another layer over this one
    pub fn merge(&mut self, other: MarvinConfig) {
        merge_values(&mut self.root, other.root);
    }

    /// Set the value at a dotted key, creating intermediate mappings
    pub fn set(&mut self, key: &str, value: Value) {
        let mut current = &mut self.root;
        for part in key.split('.') {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            current = &mut current[part];
        }
        *current = value;
    }

    /// Apply a `key=value` override; the value is parsed as a YAML scalar
    pub fn define(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (key, raw) = spec
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidDefine(spec.to_string()))?;

        let value = if raw.is_empty() {
            Value::String(String::new())
        } else {
            serde_yaml::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        };

        self.set(key.trim(), value);
        Ok(())
    }

    /// The configured registry collision policy
    pub fn collision_policy(&self) -> Result<CollisionPolicy, ConfigError> {
        self.get_string("marvin.collisionPolicy", "replace")
            .parse()
            .map_err(|message| ConfigError::InvalidSetting {
                key: "marvin.collisionPolicy".to_string(),
                message,
            })
    }

    /// Validate the settings marvin relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collision_policy()?;

        if self.get_string("marvin.artifactDir", "").trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "marvin.artifactDir".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let rules_key = "marvin.git-hook.commit-msg.settings.rules";
        if let Some(Value::Object(rules)) = self.get(rules_key) {
            for (name, rule) in rules {
                if let Some(pattern) = rule.get("pattern").and_then(Value::as_str) {
                    Regex::new(pattern).map_err(|e| ConfigError::InvalidSetting {
                        key: format!("{}.{}.pattern", rules_key, name),
                        message: e.to_string(),
                    })?;
                }
            }
        }

        Ok(())
    }

    /// The whole configuration tree
    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

impl Default for MarvinConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ConfigLookup for MarvinConfig {
    fn get(&self, key: &str) -> Option<Value> {
        lookup(&self.root, key).cloned()
    }
}

/// Walk a value tree along a dotted path
pub fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return Some(root);
    }
    key.split('.').try_fold(root, |current, part| match current {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
