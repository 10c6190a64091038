use super::{read_file, JobError};
use crate::shared::serde_ext::{default_true, null_as_default};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawInputFile {
    name: String,
    #[serde(default)]
    value: Value,
    #[serde(default = "default_true")]
    required: bool,
    #[serde(default)]
    allow_multiple: bool,
    #[serde(default, rename = "type")]
    class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArgument {
    name: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawOutputFileSpec {
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    meta_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawOutputFile {
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    file: RawOutputFileSpec,
    #[serde(default = "default_true")]
    required: bool,
    #[serde(default)]
    allow_multiple: bool,
}

#[derive(Debug, Deserialize)]
struct RawJobDescriptor {
    #[serde(default)]
    input_files: Option<Vec<RawInputFile>>,
    #[serde(default)]
    arguments: Option<Vec<RawArgument>>,
    #[serde(default)]
    output_files: Option<Vec<RawOutputFile>>,
}

fn identifier_of(value: Value) -> Result<String, Value> {
    match value {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(other),
    }
}

/// Catalog identifiers bound by one `input_files` entry. Numbers are accepted
/// and kept in their JSON spelling.
fn identifiers_of(role: &str, value: Value) -> Result<Vec<String>, String> {
    let ids = match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(identifier_of).collect(),
        other => identifier_of(other).map(|id| vec![id]),
    };
    ids.map_err(|value| {
        format!("input role `{role}` has unsupported identifier {value}; expected a string, a number or a list of them")
    })
}

/// One input role with every identifier bound to it, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRole {
    pub name: String,
    pub identifiers: Vec<String>,
    pub required: bool,
    pub allow_multiple: bool,
    /// Semantic type declared on the role, if any (e.g. `file`, `Directory`).
    pub class: Option<String>,
}

impl InputRole {
    pub fn is_multiple(&self) -> bool {
        self.allow_multiple || self.identifiers.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputDeclaration {
    pub name: String,
    /// Preset location, relative to the execution directory unless absolute.
    pub file_path: Option<String>,
    pub data_type: Option<String>,
    pub file_type: Option<String>,
    pub meta_data: Map<String, Value>,
    pub required: bool,
    pub allow_multiple: bool,
}

impl OutputDeclaration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            file_path: None,
            data_type: None,
            file_type: None,
            meta_data: Map::new(),
            required: true,
            allow_multiple: false,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.file_path = Some(path.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDescriptor {
    pub inputs: IndexMap<String, InputRole>,
    pub arguments: IndexMap<String, Value>,
    pub outputs: Vec<OutputDeclaration>,
}

pub fn read_job_descriptor(path: &Path) -> Result<JobDescriptor, JobError> {
    let raw = read_file(path)?;
    parse_job_descriptor(&raw, &path.display().to_string())
}

/// Parses a job descriptor. `origin` names the source in error messages.
pub fn parse_job_descriptor(raw: &str, origin: &str) -> Result<JobDescriptor, JobError> {
    let parsed: RawJobDescriptor = serde_json::from_str(raw).map_err(|source| JobError::Parse {
        path: origin.to_string(),
        source,
    })?;
    let missing = |section| JobError::MissingSection {
        path: origin.to_string(),
        section,
    };
    let input_files = parsed.input_files.ok_or_else(|| missing("input_files"))?;
    let arguments = parsed.arguments.ok_or_else(|| missing("arguments"))?;
    let output_files = parsed.output_files.ok_or_else(|| missing("output_files"))?;
    let invalid = |reason: String| JobError::Invalid {
        path: origin.to_string(),
        reason,
    };

    let mut inputs: IndexMap<String, InputRole> = IndexMap::new();
    for entry in input_files {
        if entry.name.trim().is_empty() {
            return Err(invalid("input_files entry has an empty name".to_string()));
        }
        let identifiers: Vec<String> = identifiers_of(&entry.name, entry.value)
            .map_err(invalid)?
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .collect();

        let role = inputs
            .entry(entry.name.clone())
            .or_insert_with(|| InputRole {
                name: entry.name.clone(),
                identifiers: Vec::new(),
                required: false,
                allow_multiple: false,
                class: None,
            });
        role.identifiers.extend(identifiers);
        role.required |= entry.required;
        role.allow_multiple |= entry.allow_multiple;
        if role.class.is_none() {
            role.class = entry.class;
        }
    }

    let mut argument_map = IndexMap::new();
    for argument in arguments {
        if argument.name.trim().is_empty() {
            return Err(invalid("arguments entry has an empty name".to_string()));
        }
        argument_map.insert(argument.name, argument.value);
    }

    let mut seen = HashSet::new();
    let mut outputs = Vec::with_capacity(output_files.len());
    for entry in output_files {
        if entry.name.trim().is_empty() {
            return Err(invalid("output_files entry has an empty name".to_string()));
        }
        if !seen.insert(entry.name.clone()) {
            return Err(invalid(format!(
                "output_files declares `{}` more than once",
                entry.name
            )));
        }
        outputs.push(OutputDeclaration {
            name: entry.name,
            file_path: entry.file.file_path.filter(|p| !p.trim().is_empty()),
            data_type: entry.file.data_type,
            file_type: entry.file.file_type,
            meta_data: entry.file.meta_data,
            required: entry.required,
            allow_multiple: entry.allow_multiple,
        });
    }

    Ok(JobDescriptor {
        inputs,
        arguments: argument_map,
        outputs,
    })
}
