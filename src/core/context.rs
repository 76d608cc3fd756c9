//! Pipeline context - shared state between steps

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Mutable state shared by every step of one pipeline run
///
/// Keys are dot-namespaced by convention (`nextVersionNumber.semver`), but no
/// schema is enforced: any step may read what an earlier step wrote, and a
/// later write silently replaces an earlier one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineContext {
    /// Identifier of the run this context belongs to
    pub execution_id: Uuid,

    /// Values written by the engine and by steps
    data: BTreeMap<String, Value>,
}

impl PipelineContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            data: BTreeMap::new(),
        }
    }

    /// Create a context seeded with initial values
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut ctx = Self::new();
        for (key, value) in values {
            ctx.data.insert(key.into(), value);
        }
        ctx
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a raw value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a mutable raw value
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Get a string value; `None` when missing or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }

    /// Get a list of strings; non-string items are ignored
    pub fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.data.get(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value, returning it
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// All keys currently set, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}
