use crate::shared::serde_ext::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description of one data artifact: its semantic category, format, location,
/// provenance and free-form attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta_data: Map<String, Value>,
}

impl Metadata {
    pub fn new(
        data_type: Option<&str>,
        file_type: Option<&str>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            data_type: data_type.map(str::to_string),
            file_type: file_type.map(str::to_string),
            file_path: file_path.into(),
            sources: Vec::new(),
            meta_data: Map::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_meta_data(mut self, meta_data: Map<String, Value>) -> Self {
        self.meta_data = meta_data;
        self
    }

    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.meta_data.insert(key.to_string(), value);
        self
    }

    /// The `type` attribute some catalogs store in `meta_data`.
    pub fn meta_type(&self) -> Option<&str> {
        self.meta_data.get("type").and_then(Value::as_str)
    }

    /// Derives the record of a new artifact produced from `parents`.
    ///
    /// `data_type` and `file_type` come from the first parent, `meta_data` is
    /// merged left to right (later parents win on conflicting keys) and
    /// `sources` lists every parent's `file_path` in order. The child owns its
    /// own copy of every value, so mutating it never touches a parent.
    ///
    /// Returns `None` when `parents` is empty.
    pub fn get_child(parents: &[Metadata], path: impl Into<String>) -> Option<Metadata> {
        let (first, rest) = parents.split_first()?;
        let mut meta_data = first.meta_data.clone();
        for parent in rest {
            for (key, value) in &parent.meta_data {
                meta_data.insert(key.clone(), value.clone());
            }
        }
        Some(Metadata {
            data_type: first.data_type.clone(),
            file_type: first.file_type.clone(),
            file_path: path.into(),
            sources: parents.iter().map(|p| p.file_path.clone()).collect(),
            meta_data,
        })
    }
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let meta_data = Value::Object(self.meta_data.clone());
        write!(
            f,
            "<Metadata data_type: {} file_type: {} file_path: {} sources: [{}] meta_data: {}>",
            self.data_type.as_deref().unwrap_or("-"),
            self.file_type.as_deref().unwrap_or("-"),
            self.file_path,
            self.sources.join(", "),
            meta_data
        )
    }
}
