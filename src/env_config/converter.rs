//! settings.php overrides from resolved env config items

use super::handler::{EnvConfigItem, ValueKind};
use super::php::{array_key, quote, var_export};
use serde_json::Value;
use std::collections::BTreeMap;

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Renders `$name['a']['b'] = <value>;` lines
pub struct DrupalConfigConverter {
    env: EnvLookup,
}

impl Default for DrupalConfigConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DrupalConfigConverter {
    pub fn new() -> Self {
        Self {
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Resolve `envVarNow` items through `lookup` instead of the process environment
    pub fn with_env_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            env: Box::new(lookup),
        }
    }

    /// One line per item that is enabled for at least one enabled site
    pub fn key_value_pairs(&self, items: &[EnvConfigItem], sites: &BTreeMap<String, bool>) -> String {
        let lines: Vec<String> = items
            .iter()
            .filter(|item| {
                item.sites
                    .iter()
                    .any(|(site, enabled)| *enabled && sites.get(site).copied().unwrap_or(false))
            })
            .map(|item| self.key_value(item))
            .collect();

        if lines.is_empty() {
            String::new()
        } else {
            format!("{}\n", lines.join("\n"))
        }
    }

    pub fn key_value(&self, item: &EnvConfigItem) -> String {
        format!("{} = {};", render_key(&item.key), self.render_value(item))
    }

    fn render_value(&self, item: &EnvConfigItem) -> String {
        match item.kind {
            ValueKind::Value => var_export(&item.value),
            ValueKind::EnvVarNow => match (self.env)(&env_var_name(&item.value)) {
                Some(value) => quote(&value),
                None => "false".to_string(),
            },
            ValueKind::EnvVarLater => format!("getenv({})", quote(&env_var_name(&item.value))),
        }
    }
}

fn render_key(parts: &[String]) -> String {
    let mut php = String::from("$");
    if let Some((name, keys)) = parts.split_first() {
        php.push_str(name);
        for key in keys {
            php.push('[');
            php.push_str(&array_key(key));
            php.push(']');
        }
    }
    php
}

fn env_var_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
