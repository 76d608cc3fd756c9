//! Per-environment resolution of env config items

use super::EnvConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_TARGET: &str = "default";
pub const DEFAULT_SITE: &str = "default";

/// How the value of an item is turned into PHP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    /// The value itself
    #[default]
    Value,
    /// The named environment variable, read while generating
    EnvVarNow,
    /// The named environment variable, read by PHP at runtime
    EnvVarLater,
}

/// One target's contribution to an item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetValue {
    #[serde(rename = "type", default)]
    pub kind: Option<ValueKind>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl TargetValue {
    fn is_empty(&self) -> bool {
        self.kind.is_none() && self.value.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawItem {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    key: Vec<Value>,
    #[serde(default)]
    sites: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    value: BTreeMap<String, TargetValue>,
}

fn enabled_by_default() -> bool {
    true
}

/// An item resolved for one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvConfigItem {
    /// Variable name followed by the array keys below it
    pub key: Vec<String>,
    pub sites: BTreeMap<String, bool>,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub value: Value,
}

pub struct EnvConfigHandler;

impl EnvConfigHandler {
    /// Resolve the raw items of a document for `target`
    ///
    /// Disabled items are dropped. Target values are merged over the
    /// `default` target; items with neither are dropped.
    pub fn normalize(items: &Value, target: &str) -> Result<Vec<EnvConfigItem>, EnvConfigError> {
        let raw: Vec<&Value> = match items {
            Value::Null => Vec::new(),
            Value::Array(list) => list.iter().collect(),
            Value::Object(map) => map.values().collect(),
            other => {
                return Err(EnvConfigError::InvalidDocument(format!(
                    "expected a list of items, got {}",
                    other
                )))
            }
        };

        let mut normalized = Vec::new();
        for (index, item) in raw.into_iter().enumerate() {
            let item: RawItem = serde_json::from_value(item.clone())
                .map_err(|e| EnvConfigError::InvalidItem { index, source: e })?;
            if !item.enabled {
                continue;
            }
            if item.key.is_empty() {
                return Err(EnvConfigError::InvalidDocument(format!(
                    "item {} has an empty key",
                    index
                )));
            }

            let mut values = item.value;
            let default = values.remove(DEFAULT_TARGET).filter(|v| !v.is_empty());
            let resolved = match (values.remove(target), default) {
                (Some(own), Some(default)) => TargetValue {
                    kind: own.kind.or(default.kind),
                    value: own.value.or(default.value),
                },
                (Some(own), None) => own,
                (None, Some(default)) => default,
                (None, None) => continue,
            };

            normalized.push(EnvConfigItem {
                key: item.key.iter().map(key_part).collect(),
                sites: item
                    .sites
                    .unwrap_or_else(|| BTreeMap::from([(DEFAULT_SITE.to_string(), true)])),
                kind: resolved.kind.unwrap_or_default(),
                value: resolved.value.unwrap_or(Value::Null),
            });
        }

        Ok(normalized)
    }
}

pub(crate) fn key_part(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty() {
        assert!(EnvConfigHandler::normalize(&json!([]), "dev").unwrap().is_empty());
        assert!(EnvConfigHandler::normalize(&Value::Null, "dev").unwrap().is_empty());
    }

    #[test]
    fn test_normalize() {
        let items = json!([
            {
                "key": ["a"],
                "value": {"default": {"type": "value", "value": "a-default"}}
            },
            {
                "key": ["b"],
                "sites": {"all": true},
                "value": {
                    "default": {"type": "envVarNow", "value": "b-default"},
                    "dev": {"value": "b-dev"}
                }
            },
            {
                "key": ["c"],
                "value": {
                    "prod": {"type": "envVarNow", "value": "c-prod"},
                    "stage": {"type": "envVarLater", "value": "c-stage"}
                }
            },
            {
                "enabled": false,
                "key": ["d"],
                "value": {"dev": {"type": "envVarNow", "value": "d-dev"}}
            }
        ]);

        let normalized = EnvConfigHandler::normalize(&items, "dev").unwrap();
        assert_eq!(
            normalized,
            vec![
                EnvConfigItem {
                    key: vec!["a".to_string()],
                    sites: BTreeMap::from([("default".to_string(), true)]),
                    kind: ValueKind::Value,
                    value: json!("a-default"),
                },
                EnvConfigItem {
                    key: vec!["b".to_string()],
                    sites: BTreeMap::from([("all".to_string(), true)]),
                    kind: ValueKind::EnvVarNow,
                    value: json!("b-dev"),
                },
            ]
        );
    }

    #[test]
    fn test_numeric_key_parts() {
        let items = json!([{"key": ["a", 0], "value": {"default": {"value": 1}}}]);
        let normalized = EnvConfigHandler::normalize(&items, "prod").unwrap();
        assert_eq!(normalized[0].key, vec!["a", "0"]);
    }

    #[test]
    fn test_invalid_items() {
        let missing_key = json!([{"value": {"default": {"value": 1}}}]);
        assert!(matches!(
            EnvConfigHandler::normalize(&missing_key, "dev"),
            Err(EnvConfigError::InvalidItem { index: 0, .. })
        ));
        assert!(EnvConfigHandler::normalize(&json!("nope"), "dev").is_err());
    }
}
