use super::{write_artifact, Invocation, InvocationContext};
use crate::config::{Configuration, MaskedKeys};
use crate::error::AdapterError;
use crate::inputs::{Binding, ResolvedInputs, OUTPUT_FOLDER_ROLE};
use crate::metadata::Metadata;
use crate::runner::CommandSpec;
use indexmap::IndexMap;
use serde::Serialize;

pub const WORKFLOW_URL_KEY: &str = "cwl_wf_url";
pub const WORKFLOW_TAG_KEY: &str = "cwl_wf_tag";
pub const DEFAULT_WORKFLOW_BINARY: &str = "cwltool";
const ARTIFACT_STEM: &str = "inputs_cwl";
const DEFAULT_CLASS: &str = "File";
const DIRECTORY_CLASS: &str = "Directory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLocation {
    pub class: String,
    pub location: String,
}

/// One top-level entry of the workflow parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Location(FileLocation),
    Locations(Vec<FileLocation>),
    Scalar(String),
}

/// Maps the catalog's lowercase `file` token to the workflow engine's `File`
/// class; every other token passes through unchanged.
pub fn normalize_class(token: &str) -> String {
    if token == "file" {
        "File".to_string()
    } else {
        token.to_string()
    }
}

fn location(declared: Option<&str>, record: &Metadata) -> FileLocation {
    let token = declared.or_else(|| record.meta_type()).unwrap_or(DEFAULT_CLASS);
    FileLocation {
        class: normalize_class(token),
        location: record.file_path.clone(),
    }
}

/// Role → `{class, location}` for every resolved input, the execution
/// directory as `output_folder`, then every non-masked argument as text.
pub fn build_parameters(
    inputs: &ResolvedInputs,
    configuration: &Configuration,
    masked: &MaskedKeys,
) -> IndexMap<String, ParameterValue> {
    let mut params = IndexMap::new();
    for role in inputs.roles() {
        let declared = role.class.as_deref();
        let value = match &role.binding {
            Binding::Single(record) => ParameterValue::Location(location(declared, record)),
            Binding::Multiple(records) => ParameterValue::Locations(
                records.iter().map(|record| location(declared, record)).collect(),
            ),
        };
        params.insert(role.name.clone(), value);
    }
    params.insert(
        OUTPUT_FOLDER_ROLE.to_string(),
        ParameterValue::Location(FileLocation {
            class: DIRECTORY_CLASS.to_string(),
            location: inputs.output_folder().display().to_string(),
        }),
    );
    for (key, value) in configuration.forwarded(masked) {
        params.insert(key.to_string(), ParameterValue::Scalar(value));
    }
    params
}

/// Writes `inputs_cwl.<ext>` into the execution directory and returns
/// `<binary> <cwl_wf_url> <artifact>`.
pub fn build_workflow_invocation(ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError> {
    let url = ctx
        .configuration
        .get_str(WORKFLOW_URL_KEY)
        .ok_or_else(|| AdapterError::MissingArgument {
            tool: ctx.tool.to_string(),
            name: WORKFLOW_URL_KEY.to_string(),
        })?;

    let params = build_parameters(ctx.inputs, ctx.configuration, ctx.masked);
    let artifact = ctx.artifact_path(ARTIFACT_STEM);
    write_artifact(&params, &artifact, ctx.settings.artifact_format)?;

    let command = CommandSpec::new(ctx.binary_or(DEFAULT_WORKFLOW_BINARY), ctx.execution_dir)
        .arg(url)
        .arg(artifact.display().to_string());
    Ok(Invocation {
        command,
        artifact: Some(artifact),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lowercase_file_is_capitalized() {
        assert_eq!(normalize_class("file"), "File");
        assert_eq!(normalize_class("Directory"), "Directory");
        assert_eq!(normalize_class("FILE"), "FILE");
    }

    #[test]
    fn scalar_and_location_serialize_flat() {
        let mut params = IndexMap::new();
        params.insert(
            "reads".to_string(),
            ParameterValue::Location(FileLocation {
                class: "File".to_string(),
                location: "/data/r.fq".to_string(),
            }),
        );
        params.insert("threads".to_string(), ParameterValue::Scalar("4".to_string()));

        let rendered = serde_json::to_value(&params).expect("json");
        assert_eq!(
            rendered,
            serde_json::json!({
                "reads": {"class": "File", "location": "/data/r.fq"},
                "threads": "4"
            })
        );
    }
}
