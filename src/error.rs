use crate::config::SettingsError;
use crate::job::JobError;
use std::path::Path;

/// Coarse classification of [`AdapterError`] for callers that only need to
/// know what went wrong, not the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedConfig,
    UnresolvedReference,
    InvocationBuild,
    MissingArgument,
    MissingOutput,
    MetadataCountMismatch,
    ExternalProcess,
    Timeout,
    Cancelled,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum InvocationBuildSource {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("malformed job configuration: {0}")]
    MalformedConfig(#[source] JobError),
    #[error("invalid adapter settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("input role `{role}` references unknown identifier `{identifier}`")]
    UnresolvedReference { role: String, identifier: String },
    #[error("failed to build invocation artifact {path}: {source}")]
    InvocationBuild {
        path: String,
        #[source]
        source: InvocationBuildSource,
    },
    #[error("missing argument `{name}` for {tool} invocation")]
    MissingArgument { tool: String, name: String },
    #[error("required output `{role}` was not found at `{path}`")]
    MissingOutput { role: String, path: String },
    #[error("output `{role}` has {metadata} metadata entries for {files} files; expected 1 or {files}")]
    MetadataCountMismatch {
        role: String,
        files: usize,
        metadata: usize,
    },
    #[error("{tool} exited with code {exit_code}: {stderr_tail}")]
    ExternalProcess {
        tool: String,
        exit_code: i32,
        stderr_tail: String,
    },
    #[error("{tool} timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },
    #[error("{tool} was cancelled")]
    Cancelled { tool: String },
    #[error("{tool} binary not found: {binary}")]
    MissingBinary { tool: String, binary: String },
    #[error("failed to write job result: {0}")]
    ResultWrite(#[source] JobError),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedConfig(_) | Self::Settings(_) => ErrorKind::MalformedConfig,
            Self::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Self::InvocationBuild { .. } => ErrorKind::InvocationBuild,
            Self::MissingArgument { .. } => ErrorKind::MissingArgument,
            Self::MissingOutput { .. } => ErrorKind::MissingOutput,
            Self::MetadataCountMismatch { .. } => ErrorKind::MetadataCountMismatch,
            Self::ExternalProcess { .. } | Self::MissingBinary { .. } => {
                ErrorKind::ExternalProcess
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::ResultWrite(_) | Self::Io { .. } => ErrorKind::Io,
        }
    }
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> AdapterError {
    AdapterError::Io {
        path: path.display().to_string(),
        source,
    }
}
