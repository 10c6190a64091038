use crate::error::AdapterError;
use crate::job::{InputCatalog, InputRole};
use crate::metadata::Metadata;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Synthetic role bound to the execution directory.
pub const OUTPUT_FOLDER_ROLE: &str = "output_folder";

/// Roles the ML toolbox always consumes as path lists.
const PATH_LIST_ROLES: [&str; 2] = ["images", "segmentations"];

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Single(Metadata),
    Multiple(Vec<Metadata>),
}

impl Binding {
    pub fn records(&self) -> &[Metadata] {
        match self {
            Self::Single(record) => std::slice::from_ref(record),
            Self::Multiple(records) => records,
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|record| record.file_path.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRole {
    pub name: String,
    /// Type declared on the role in the job descriptor.
    pub class: Option<String>,
    pub binding: Binding,
}

impl ResolvedRole {
    /// Declared role type, falling back to the first record's `meta_data.type`.
    pub fn class_token(&self) -> Option<&str> {
        self.class
            .as_deref()
            .or_else(|| self.binding.records().first().and_then(Metadata::meta_type))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathBinding {
    One(String),
    Many(Vec<String>),
}

impl PathBinding {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path.clone()],
            Self::Many(paths) => paths.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInputs {
    roles: IndexMap<String, ResolvedRole>,
    output_folder: PathBuf,
}

impl ResolvedInputs {
    pub fn get(&self, role: &str) -> Option<&ResolvedRole> {
        self.roles.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &ResolvedRole> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Role → path projection. `images` and `segmentations` are always lists;
    /// `output_folder` is not part of it.
    pub fn paths(&self) -> IndexMap<String, PathBinding> {
        self.roles
            .values()
            .map(|role| {
                let binding = match &role.binding {
                    Binding::Single(record) if !PATH_LIST_ROLES.contains(&role.name.as_str()) => {
                        PathBinding::One(record.file_path.clone())
                    }
                    other => PathBinding::Many(other.paths()),
                };
                (role.name.clone(), binding)
            })
            .collect()
    }

    /// Every input record's path, in role then identifier order.
    pub fn source_paths(&self) -> Vec<String> {
        self.records().map(|record| record.file_path.clone()).collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &Metadata> {
        self.roles.values().flat_map(|role| role.binding.records())
    }
}

/// Joins the job's role → identifier mapping against the catalog.
///
/// Roles declared with several identifiers (or `allow_multiple`) keep their
/// identifier order. Optional roles with no identifier are left out; a
/// required role with none is reported as an unresolved reference with an
/// empty identifier.
pub fn resolve_inputs(
    roles: &IndexMap<String, InputRole>,
    catalog: &InputCatalog,
    execution_dir: &Path,
) -> Result<ResolvedInputs, AdapterError> {
    let mut resolved = IndexMap::with_capacity(roles.len());
    for role in roles.values() {
        if role.identifiers.is_empty() {
            if role.required {
                return Err(AdapterError::UnresolvedReference {
                    role: role.name.clone(),
                    identifier: String::new(),
                });
            }
            tracing::debug!(role = %role.name, "optional input role has no identifier; skipping");
            continue;
        }

        let mut records = Vec::with_capacity(role.identifiers.len());
        for id in &role.identifiers {
            let record = catalog
                .get(id)
                .ok_or_else(|| AdapterError::UnresolvedReference {
                    role: role.name.clone(),
                    identifier: id.clone(),
                })?;
            records.push(record.clone());
        }

        let binding = if role.is_multiple() {
            Binding::Multiple(records)
        } else {
            match records.pop() {
                Some(record) => Binding::Single(record),
                None => continue,
            }
        };
        resolved.insert(
            role.name.clone(),
            ResolvedRole {
                name: role.name.clone(),
                class: role.class.clone(),
                binding,
            },
        );
    }

    tracing::debug!(
        roles = resolved.len(),
        output_folder = %execution_dir.display(),
        "resolved input roles"
    );
    Ok(ResolvedInputs {
        roles: resolved,
        output_folder: execution_dir.to_path_buf(),
    })
}
