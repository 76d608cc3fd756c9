//! Environment specific PHP configuration
//!
//! Turns a YAML description of per-environment overrides into PHP snippets
//! for settings.php and sites.php. These run standalone, outside of any
//! pipeline.

pub mod converter;
pub mod handler;
pub mod php;
pub mod sites_php;

pub use converter::DrupalConfigConverter;
pub use handler::{EnvConfigHandler, EnvConfigItem, ValueKind};
pub use sites_php::SitesPhpGenerator;

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid env config item #{index}: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid env config: {0}")]
    InvalidDocument(String),

    #[error("Invalid env var name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Read the YAML source from `file`, or stdin when absent
pub fn read_source(file: Option<&Path>) -> Result<String, EnvConfigError> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| EnvConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|source| EnvConfigError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(content)
        }
    }
}

pub fn parse_document(yaml: &str) -> Result<Value, EnvConfigError> {
    if yaml.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(yaml)?)
}

static NULL: Value = Value::Null;

/// The value under `parents`; `Null` when the path does not exist
pub fn descend<'a>(document: &'a Value, parents: &[String]) -> &'a Value {
    parents
        .iter()
        .try_fold(document, |value, key| match value {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .unwrap_or(&NULL)
}

/// `settings.php` lines for `target`, limited to `sites`
pub fn settings_php(
    yaml: &str,
    target: &str,
    sites: &[String],
    parents: &[String],
) -> Result<String, EnvConfigError> {
    let document = parse_document(yaml)?;
    let items = EnvConfigHandler::normalize(descend(&document, parents), target)?;
    let sites: BTreeMap<String, bool> = sites.iter().map(|site| (site.clone(), true)).collect();

    Ok(DrupalConfigConverter::new().key_value_pairs(&items, &sites))
}

/// `sites.php` content from the mapping under `parents`
pub fn sites_php(yaml: &str, env_var_name_pattern: Option<&str>, parents: &[String]) -> Result<String, EnvConfigError> {
    let document = parse_document(yaml)?;
    let mapping = match descend(&document, parents) {
        Value::Null => serde_json::Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(EnvConfigError::InvalidDocument(format!(
                "expected a name => directory mapping, got {}",
                other
            )))
        }
    };

    let mut generator = SitesPhpGenerator::new(mapping);
    if let Some(pattern) = env_var_name_pattern {
        generator = generator.env_var_name_pattern(pattern);
    }
    generator.generate()
}

#[derive(Debug, Deserialize)]
struct SettingsEntry {
    key: Vec<Value>,
    #[serde(default)]
    value: Value,
}

/// A single `settings.php` assignment from a `{key: [...], value: ...}` entry
pub fn settings_php_entry(yaml: &str) -> Result<String, EnvConfigError> {
    let entry: SettingsEntry = serde_json::from_value(parse_document(yaml)?)
        .map_err(|e| EnvConfigError::InvalidDocument(format!("invalid entry: {}", e)))?;
    if entry.key.is_empty() {
        return Err(EnvConfigError::InvalidDocument("entry has an empty key".to_string()));
    }

    let item = EnvConfigItem {
        key: entry.key.iter().map(handler::key_part).collect(),
        sites: BTreeMap::new(),
        kind: ValueKind::Value,
        value: entry.value,
    };
    Ok(format!("{}\n", DrupalConfigConverter::new().key_value(&item)))
}

/// Split dotted or comma separated CLI lists, dropping empty parts
pub fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
