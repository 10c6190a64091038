pub mod command;
pub mod toolbox;
pub mod workflow;

pub use command::{build_shell_invocation, expand_command, TemplateToken};
pub use toolbox::{
    build_toolbox_invocation, experiment_name, parse_user_arguments, toolbox_overrides,
    typed_value, update_overrides, ToolboxArtifact,
};
pub use workflow::{
    build_parameters, build_workflow_invocation, normalize_class, FileLocation, ParameterValue,
    WORKFLOW_TAG_KEY, WORKFLOW_URL_KEY,
};

use crate::config::{ArtifactFormat, Configuration, MaskedKeys, ToolSettings};
use crate::error::{AdapterError, InvocationBuildSource};
use crate::inputs::ResolvedInputs;
use crate::job::OutputDeclaration;
use crate::runner::CommandSpec;
use crate::shared::fs_atomic::atomic_write_file;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything an adapter may draw on to build its tool invocation.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext<'a> {
    pub tool: &'a str,
    pub inputs: &'a ResolvedInputs,
    pub configuration: &'a Configuration,
    pub masked: &'a MaskedKeys,
    pub outputs: &'a [OutputDeclaration],
    pub execution_dir: &'a Path,
    pub settings: &'a ToolSettings,
}

impl InvocationContext<'_> {
    /// `<execution_dir>/<stem>.<ext>` for the configured artifact format.
    pub fn artifact_path(&self, stem: &str) -> PathBuf {
        self.execution_dir
            .join(format!("{stem}.{}", self.settings.artifact_format.extension()))
    }

    pub fn binary_or<'b>(&'b self, fallback: &'b str) -> &'b str {
        self.settings.binary.as_deref().unwrap_or(fallback)
    }
}

/// A ready-to-run command plus the parameter file written for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandSpec,
    pub artifact: Option<PathBuf>,
}

/// Serializes `value` to `path` in `format`. Failures are logged here and
/// returned as `InvocationBuild` with the underlying cause attached.
pub fn write_artifact<T: Serialize>(
    value: &T,
    path: &Path,
    format: ArtifactFormat,
) -> Result<(), AdapterError> {
    let rendered: Result<String, InvocationBuildSource> = match format {
        ArtifactFormat::Yaml => serde_yaml::to_string(value).map_err(Into::into),
        ArtifactFormat::Json => serde_json::to_string_pretty(value)
            .map(|text| text + "\n")
            .map_err(Into::into),
    };
    rendered
        .and_then(|text| atomic_write_file(path, text.as_bytes()).map_err(Into::into))
        .map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "failed to write invocation artifact");
            AdapterError::InvocationBuild {
                path: path.display().to_string(),
                source,
            }
        })?;
    tracing::debug!(path = %path.display(), "wrote invocation artifact");
    Ok(())
}
