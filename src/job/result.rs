use super::{read_file, JobError};
use crate::metadata::Metadata;
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::serde_ext::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// One produced file in the job result descriptor. Field order is the
/// serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub name: String,
    pub file_path: String,
    pub data_type: Option<String>,
    pub file_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta_data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
}

impl ResultEntry {
    pub fn from_metadata(name: &str, metadata: &Metadata) -> Self {
        Self {
            name: name.to_string(),
            file_path: metadata.file_path.clone(),
            data_type: metadata.data_type.clone(),
            file_type: metadata.file_type.clone(),
            meta_data: metadata.meta_data.clone(),
            sources: metadata.sources.clone(),
        }
    }

    pub fn to_metadata(&self) -> Metadata {
        Metadata {
            data_type: self.data_type.clone(),
            file_type: self.file_type.clone(),
            file_path: self.file_path.clone(),
            sources: self.sources.clone(),
            meta_data: self.meta_data.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub output_files: Vec<ResultEntry>,
}

impl JobResult {
    pub fn entries_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ResultEntry> {
        self.output_files.iter().filter(move |entry| entry.name == name)
    }
}

/// Renders the descriptor as 4-space indented JSON. Identical input always
/// yields identical bytes.
pub fn render_job_result(result: &JobResult) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    result.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_job_result(path: &Path, result: &JobResult) -> Result<(), JobError> {
    let rendered = render_job_result(result).map_err(|source| JobError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(path, rendered.as_bytes()).map_err(|source| JobError::Write {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_job_result(path: &Path) -> Result<JobResult, JobError> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|source| JobError::Parse {
        path: path.display().to_string(),
        source,
    })
}
