use crate::shared::paths::resolve_against;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const EXECUTION_KEY: &str = "execution";
/// Keys every adapter reserves for the runtime rather than the tool.
pub const BASE_MASKED_KEYS: [&str; 3] = [EXECUTION_KEY, "project", "description"];

/// Configuration keys that are never forwarded to the external tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskedKeys(BTreeSet<String>);

impl MaskedKeys {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self(keys.into_iter().map(str::to_string).collect())
    }

    pub fn base() -> Self {
        Self::new(BASE_MASKED_KEYS)
    }

    pub fn with_base<'a>(extra: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(BASE_MASKED_KEYS.into_iter().chain(extra))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// The option set of one job, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: IndexMap<String, Value>,
}

impl Configuration {
    /// Overlays job `arguments` on adapter `defaults` into a fresh map. List
    /// values are flattened to one space-joined string.
    pub fn merged(defaults: &BTreeMap<String, Value>, arguments: &IndexMap<String, Value>) -> Self {
        let mut values = IndexMap::new();
        for (key, value) in defaults {
            values.insert(key.clone(), flatten_list(value));
        }
        for (key, value) in arguments {
            values.insert(key.clone(), flatten_list(value));
        }
        Self { values }
    }

    pub fn from_arguments(arguments: &IndexMap<String, Value>) -> Self {
        Self::merged(&BTreeMap::new(), arguments)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The value rendered as text, or `None` when absent, null or blank.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .filter(|value| !value.is_null())
            .map(stringify)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every non-masked entry, stringified, in insertion order.
    pub fn forwarded<'a>(
        &'a self,
        masked: &'a MaskedKeys,
    ) -> impl Iterator<Item = (&'a str, String)> + 'a {
        self.values
            .iter()
            .filter(move |(key, _)| !masked.contains(key))
            .map(|(key, value)| (key.as_str(), stringify(value)))
    }

    /// Absolute execution directory: the `execution` value resolved against
    /// `base_dir`, or `base_dir` itself when unset.
    pub fn execution_dir(&self, base_dir: &Path) -> PathBuf {
        let configured = self.get_str(EXECUTION_KEY).unwrap_or_else(|| ".".to_string());
        resolve_against(base_dir, Path::new(&configured))
    }
}

fn flatten_list(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(stringify)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => other.clone(),
    }
}

/// Scalar text form used when forwarding values to a tool.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
