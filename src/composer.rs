//! Read and edit a project's composer.json

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const COMPOSER_JSON: &str = "composer.json";

/// Drupal root used when composer.json does not say
pub const DEFAULT_DRUPAL_ROOT: &str = "docroot";

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not contain a JSON object")]
    NotAnObject(PathBuf),
}

/// Parsed composer.json of a directory
#[derive(Debug, Clone)]
pub struct ComposerInfo {
    path: PathBuf,
    json: Value,
}

impl ComposerInfo {
    /// Load `<dir>/composer.json`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ComposerError> {
        let path = dir.as_ref().join(COMPOSER_JSON);
        let content = std::fs::read_to_string(&path).map_err(|source| ComposerError::Io {
            path: path.clone(),
            source,
        })?;
        let json: Value = serde_json::from_str(&content).map_err(|source| ComposerError::Json {
            path: path.clone(),
            source,
        })?;
        if !json.is_object() {
            return Err(ComposerError::NotAnObject(path));
        }
        Ok(Self { path, json })
    }

    /// Load, or fall back to an empty document when the file is missing
    pub fn load_or_default(dir: impl AsRef<Path>) -> Result<Self, ComposerError> {
        let dir = dir.as_ref();
        if dir.join(COMPOSER_JSON).exists() {
            Self::load(dir)
        } else {
            Ok(Self::from_value(dir, Value::Object(Map::new())))
        }
    }

    pub fn from_value(dir: impl AsRef<Path>, json: Value) -> Self {
        Self {
            path: dir.as_ref().join(COMPOSER_JSON),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn json_mut(&mut self) -> &mut Value {
        &mut self.json
    }

    /// Full package name, e.g. `acme/my-site`
    pub fn name(&self) -> &str {
        self.json.get("name").and_then(Value::as_str).unwrap_or("")
    }

    /// Package name without the vendor prefix
    pub fn package_name(&self) -> &str {
        let name = self.name();
        name.split_once('/').map_or(name, |(_, package)| package)
    }

    pub fn has_script(&self, script: &str) -> bool {
        self.json
            .get("scripts")
            .and_then(|scripts| scripts.get(script))
            .is_some()
    }

    /// `config.vendor-dir`, relative to the project root
    pub fn vendor_dir(&self) -> String {
        self.config_str("vendor-dir").unwrap_or_else(|| "vendor".to_string())
    }

    /// `config.bin-dir`, which defaults to `<vendor-dir>/bin`
    pub fn bin_dir(&self) -> String {
        self.config_str("bin-dir")
            .unwrap_or_else(|| format!("{}/bin", self.vendor_dir()))
    }

    fn config_str(&self, name: &str) -> Option<String> {
        self.json
            .get("config")
            .and_then(|config| config.get(name))
            .and_then(Value::as_str)
            .map(|dir| dir.trim_end_matches('/').to_string())
            .filter(|dir| !dir.is_empty())
    }

    /// Drupal root directory relative to the project root
    pub fn drupal_root_dir(&self) -> String {
        let extra = self.json.get("extra");

        let installer_paths = extra
            .and_then(|e| e.get("installer-paths"))
            .and_then(Value::as_object);
        if let Some(paths) = installer_paths {
            for (path, conditions) in paths {
                let is_core = conditions
                    .as_array()
                    .is_some_and(|c| c.iter().any(|c| c.as_str() == Some("type:drupal-core")));
                if is_core {
                    let path = path.trim_end_matches('/');
                    return path.strip_suffix("/core").unwrap_or(path).to_string();
                }
            }
        }

        let web_root = extra
            .and_then(|e| e.pointer("/drupal-scaffold/locations/web-root"))
            .and_then(Value::as_str)
            .map(|root| root.trim_start_matches("./").trim_matches('/'))
            .filter(|root| !root.is_empty());
        if let Some(root) = web_root {
            return root.to_string();
        }

        DEFAULT_DRUPAL_ROOT.to_string()
    }

    /// Write the document back with composer's four-space indentation
    pub fn write(&self) -> Result<(), ComposerError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.json
            .serialize(&mut serializer)
            .map_err(|source| ComposerError::Json {
                path: self.path.clone(),
                source,
            })?;
        buf.push(b'\n');

        std::fs::write(&self.path, buf).map_err(|source| ComposerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
