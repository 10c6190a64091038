use crate::config::ToolSettings;
use crate::error::{io_error, AdapterError};
use crate::inputs::ResolvedInputs;
use crate::job::{JobResult, OutputDeclaration, ResultEntry};
use crate::metadata::Metadata;
use crate::shared::paths::resolve_against;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata supplied for one output role: one record shared by every file,
/// or one record per file.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMetadata {
    Single(Metadata),
    PerFile(Vec<Metadata>),
}

impl OutputMetadata {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::PerFile(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducedFiles {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl ProducedFiles {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::One(path) => std::slice::from_ref(path),
            Self::Many(paths) => paths,
        }
    }

    pub fn len(&self) -> usize {
        self.paths().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }
}

fn regular_files_in(dir: &Path) -> Result<Vec<PathBuf>, AdapterError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| io_error(dir, source))? {
        let path = entry.map_err(|source| io_error(dir, source))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Checks that a declared output exists after the tool ran.
///
/// The preset path is resolved against `execution_dir`. An `allow_multiple`
/// output whose path is a directory yields every regular file in it, sorted
/// by name. A missing optional output is logged and yields `None`.
pub fn locate_output(
    output: &OutputDeclaration,
    execution_dir: &Path,
) -> Result<Option<ProducedFiles>, AdapterError> {
    let resolved = output
        .file_path
        .as_deref()
        .map(|path| resolve_against(execution_dir, Path::new(path)));

    let found = match &resolved {
        Some(path) if path.is_file() => Some(ProducedFiles::One(path.clone())),
        Some(path) if output.allow_multiple && path.is_dir() => {
            let files = regular_files_in(path)?;
            (!files.is_empty()).then_some(ProducedFiles::Many(files))
        }
        _ => None,
    };
    if found.is_some() {
        return Ok(found);
    }

    let shown = resolved
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    if output.required {
        tracing::error!(role = %output.name, path = %shown, "required output was not produced");
        return Err(AdapterError::MissingOutput {
            role: output.name.clone(),
            path: shown,
        });
    }
    tracing::warn!(role = %output.name, path = %shown, "optional output was not produced; omitting it");
    Ok(None)
}

/// Metadata for an output at `path`: declared types (or the fixed types from
/// settings), declared `meta_data`, and every input path as provenance.
pub fn output_metadata(
    output: &OutputDeclaration,
    inputs: &ResolvedInputs,
    settings: &ToolSettings,
    path: &Path,
) -> Metadata {
    let (data_type, file_type) = match &settings.fixed_output_type {
        Some(fixed) => (Some(fixed.data_type.as_str()), Some(fixed.file_type.as_str())),
        None => (output.data_type.as_deref(), output.file_type.as_deref()),
    };
    Metadata::new(data_type, file_type, path.display().to_string())
        .with_sources(inputs.source_paths())
        .with_meta_data(output.meta_data.clone())
}

/// One result entry per produced file. A single record is replicated across
/// every file; a per-file list must match the file count exactly.
pub fn expand_output(
    role: &str,
    files: &ProducedFiles,
    metadata: OutputMetadata,
) -> Result<Vec<ResultEntry>, AdapterError> {
    let paths = files.paths();
    let records = match metadata {
        OutputMetadata::Single(record) => vec![record; paths.len()],
        OutputMetadata::PerFile(records) if records.len() == paths.len() => records,
        OutputMetadata::PerFile(mut records) if records.len() == 1 => {
            let record = records.remove(0);
            vec![record; paths.len()]
        }
        OutputMetadata::PerFile(records) => {
            return Err(AdapterError::MetadataCountMismatch {
                role: role.to_string(),
                files: paths.len(),
                metadata: records.len(),
            })
        }
    };
    Ok(paths
        .iter()
        .zip(records)
        .map(|(path, mut record)| {
            record.file_path = path.display().to_string();
            ResultEntry::from_metadata(role, &record)
        })
        .collect())
}

/// Builds the job result for every declared output, in declaration order.
/// `describe` may reshape the default metadata of each produced output.
pub fn build_job_result<F>(
    outputs: &[OutputDeclaration],
    inputs: &ResolvedInputs,
    settings: &ToolSettings,
    execution_dir: &Path,
    mut describe: F,
) -> Result<JobResult, AdapterError>
where
    F: FnMut(&OutputDeclaration, &ProducedFiles, Metadata) -> OutputMetadata,
{
    let mut result = JobResult::default();
    for output in outputs {
        let Some(files) = locate_output(output, execution_dir)? else {
            continue;
        };
        let base_path = match &files {
            ProducedFiles::One(path) => path.clone(),
            ProducedFiles::Many(_) => output
                .file_path
                .as_deref()
                .map(|path| resolve_against(execution_dir, Path::new(path)))
                .unwrap_or_else(|| execution_dir.to_path_buf()),
        };
        let base = output_metadata(output, inputs, settings, &base_path);
        let metadata = describe(output, &files, base);
        let entries = expand_output(&output.name, &files, metadata)?;
        tracing::debug!(role = %output.name, files = entries.len(), "reported output");
        result.output_files.extend(entries);
    }
    Ok(result)
}
