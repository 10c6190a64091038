use super::{read_file, JobError};
use crate::metadata::Metadata;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    metadata: Metadata,
}

/// Identifier → metadata lookup for every file the VRE staged for a job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputCatalog {
    entries: IndexMap<String, Metadata>,
}

impl InputCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, metadata: Metadata) {
        self.entries.insert(id.to_string(), metadata);
    }

    pub fn get(&self, id: &str) -> Option<&Metadata> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Metadata)> for InputCatalog {
    fn from_iter<I: IntoIterator<Item = (String, Metadata)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

pub fn read_input_catalog(path: &Path) -> Result<InputCatalog, JobError> {
    let raw = read_file(path)?;
    parse_input_catalog(&raw, &path.display().to_string())
}

pub fn parse_input_catalog(raw: &str, origin: &str) -> Result<InputCatalog, JobError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(raw).map_err(|source| JobError::Parse {
        path: origin.to_string(),
        source,
    })?;
    let mut catalog = InputCatalog::new();
    for entry in entries {
        if catalog.get(&entry.id).is_some() {
            return Err(JobError::Invalid {
                path: origin.to_string(),
                reason: format!("catalog identifier `{}` appears more than once", entry.id),
            });
        }
        catalog.insert(&entry.id, entry.metadata);
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_entries_ignore_unknown_fields() {
        let raw = json!([{
            "_id": "csv-1",
            "file_path": "/data/pinfo.csv",
            "file_type": "CSV",
            "data_type": "sample_information_file",
            "compressed": 0,
            "user_id": "user_id",
            "creation_time": {"sec": 1, "usec": 0},
            "meta_data": {"type": "file", "size": 0},
            "sources": []
        }])
        .to_string();

        let catalog = parse_input_catalog(&raw, "in_metadata.json").expect("parse");
        let record = catalog.get("csv-1").expect("record");
        assert_eq!(record.file_path, "/data/pinfo.csv");
        assert_eq!(record.meta_type(), Some("file"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn missing_containers_default_to_empty() {
        let raw = json!([{"_id": "a", "file_path": "/a", "file_type": "TXT", "data_type": "x"}])
            .to_string();
        let catalog = parse_input_catalog(&raw, "in_metadata.json").expect("parse");
        let record = catalog.get("a").expect("record");
        assert!(record.sources.is_empty());
        assert!(record.meta_data.is_empty());
    }
}
