pub mod catalog;
pub mod descriptor;
pub mod result;

pub use catalog::{parse_input_catalog, read_input_catalog, InputCatalog};
pub use descriptor::{
    parse_job_descriptor, read_job_descriptor, InputRole, JobDescriptor, OutputDeclaration,
};
pub use result::{read_job_result, render_job_result, write_job_result, JobResult, ResultEntry};

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is missing required section `{section}`")]
    MissingSection { path: String, section: &'static str },
    #[error("{path}: {reason}")]
    Invalid { path: String, reason: String },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn read_file(path: &Path) -> Result<String, JobError> {
    std::fs::read_to_string(path).map_err(|source| JobError::Read {
        path: path.display().to_string(),
        source,
    })
}
