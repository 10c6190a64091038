//! Argument handling for the radiomics ML toolbox.
//!
//! The VRE form posts toolbox options as flat `group:SECTION:ITEM` keys. They
//! are folded into per-section override maps, overlaid on the toolbox's
//! section defaults, and handed to the toolbox in a parameter file together
//! with the image, segmentation and label inputs.

use super::{write_artifact, Invocation, InvocationContext};
use crate::config::{Configuration, MaskedKeys};
use crate::error::AdapterError;
use crate::runner::CommandSpec;
use serde::Serialize;
use serde_json::{Map, Number, Value};

pub const DEFAULT_TOOLBOX_BINARY: &str = "ml_toolbox";
pub const EXPERIMENT_NAME_KEY: &str = "experiment_name";
const ARTIFACT_STEM: &str = "ml_toolbox_inputs";

pub const TOOLBOX_SECTIONS: [&str; 11] = [
    "General",
    "Preprocessing",
    "ImageFeatures",
    "PyRadiomics",
    "ComBat",
    "Featsel",
    "Labels",
    "Resampling",
    "Classification",
    "CrossValidation",
    "HyperOptimization",
];

const TOP_LEVEL_KEYS: [&str; 4] = ["modus", "coarse", EXPERIMENT_NAME_KEY, "image_types"];

fn base_configs() -> Map<String, Value> {
    let mut configs = Map::new();
    configs.insert("modus".to_string(), Value::String(String::new()));
    configs.insert("coarse".to_string(), Value::Bool(false));
    configs.insert(EXPERIMENT_NAME_KEY.to_string(), Value::String("run000".to_string()));
    configs.insert("image_types".to_string(), Value::String("CT".to_string()));
    for section in TOOLBOX_SECTIONS {
        configs.insert(section.to_string(), Value::Object(Map::new()));
    }
    configs
}

/// Types a form value: `on` is true, plain numbers become numbers and
/// everything else, including comma tuples such as `1, 1, 1`, stays text.
pub fn typed_value(value: &Value) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };
    let trimmed = raw.trim();
    match trimmed {
        "on" | "True" => return Value::Bool(true),
        "False" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(float) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(float);
    }
    value.clone()
}

/// Folds `group:SECTION:ITEM` arguments into toolbox override sections.
///
/// `classifiers` items are collected into one comma separated
/// `Classification.classifiers` value, the `ML` section sets `modus`, and
/// `General.Imagetype` is lifted to the top-level `image_types`. Masked keys
/// are ignored, as is any key that is neither a top-level option nor has
/// three levels.
pub fn parse_user_arguments(configuration: &Configuration, masked: &MaskedKeys) -> Map<String, Value> {
    let mut configs = base_configs();
    let mut classifiers: Vec<String> = Vec::new();

    for (key, value) in configuration.iter() {
        if masked.contains(key) {
            continue;
        }
        if TOP_LEVEL_KEYS.contains(&key) {
            configs.insert(key.to_string(), typed_value(value));
            continue;
        }
        let levels: Vec<&str> = key.split(':').collect();
        let [_, section, item, ..] = levels.as_slice() else {
            tracing::debug!(key, "ignoring argument that is not a toolbox option");
            continue;
        };
        match *section {
            "classifiers" => classifiers.push(item.to_string()),
            "ML" => {
                configs.insert("modus".to_string(), value.clone());
            }
            _ => {
                if let Value::Object(items) = configs
                    .entry(section.to_string())
                    .or_insert_with(|| Value::Object(Map::new()))
                {
                    items.insert(item.to_string(), typed_value(value));
                }
            }
        }
    }

    if let Some(Value::Object(classification)) = configs.get_mut("Classification") {
        classification.insert(
            "classifiers".to_string(),
            Value::String(classifiers.join(", ")),
        );
    }
    let image_type = match configs.get_mut("General") {
        Some(Value::Object(general)) => general.remove("Imagetype"),
        _ => None,
    };
    if let Some(image_type) = image_type {
        configs.insert("image_types".to_string(), image_type);
    }
    configs
}

/// Overlays parsed user sections on `defaults`.
///
/// For every section field in `defaults`: the user's value when given,
/// otherwise `false` for boolean defaults and an empty string for the rest.
/// Top-level scalars always take the user's value. User fields unknown to
/// `defaults` are kept.
pub fn update_overrides(defaults: &Map<String, Value>, user: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::new();
    for (section, default) in defaults {
        match default {
            Value::Object(fields) => {
                let user_fields = user.get(section).and_then(Value::as_object);
                let mut out = Map::new();
                for (field, value) in fields {
                    let chosen = match user_fields.and_then(|u| u.get(field)) {
                        Some(given) => given.clone(),
                        None if value.is_boolean() => Value::Bool(false),
                        None => Value::String(String::new()),
                    };
                    out.insert(field.clone(), chosen);
                }
                if let Some(user_fields) = user_fields {
                    for (field, value) in user_fields {
                        if !out.contains_key(field) {
                            out.insert(field.clone(), value.clone());
                        }
                    }
                }
                merged.insert(section.clone(), Value::Object(out));
            }
            scalar => {
                let chosen = user.get(section).cloned().unwrap_or_else(|| scalar.clone());
                merged.insert(section.clone(), chosen);
            }
        }
    }
    for (section, value) in user {
        if !merged.contains_key(section) {
            merged.insert(section.clone(), value.clone());
        }
    }
    merged
}

/// Parameter file consumed by the toolbox entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolboxArtifact {
    pub images: Vec<String>,
    pub segmentations: Vec<String>,
    pub label_file: Option<String>,
    pub out_dir: String,
    pub overrides: Map<String, Value>,
}

/// Final overrides for this job: the parsed arguments over the configured
/// section defaults.
pub fn toolbox_overrides(ctx: &InvocationContext<'_>) -> Map<String, Value> {
    let user = parse_user_arguments(ctx.configuration, ctx.masked);
    if ctx.settings.toolbox_defaults.is_empty() {
        update_overrides(&base_configs(), &user)
    } else {
        update_overrides(&ctx.settings.toolbox_defaults, &user)
    }
}

pub fn experiment_name(overrides: &Map<String, Value>) -> String {
    overrides
        .get(EXPERIMENT_NAME_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("run000")
        .to_string()
}

pub fn build_toolbox_invocation(ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError> {
    let paths = ctx.inputs.paths();
    let list = |role: &str| paths.get(role).map(|p| p.to_vec()).unwrap_or_default();
    let overrides = toolbox_overrides(ctx);
    let experiment = experiment_name(&overrides);
    let artifact = ToolboxArtifact {
        images: list("images"),
        segmentations: list("segmentations"),
        label_file: list("label_file").into_iter().next(),
        out_dir: ctx.execution_dir.display().to_string(),
        overrides,
    };
    tracing::info!(
        experiment = %experiment,
        images = artifact.images.len(),
        segmentations = artifact.segmentations.len(),
        "prepared ML toolbox experiment"
    );

    let path = ctx.artifact_path(ARTIFACT_STEM);
    write_artifact(&artifact, &path, ctx.settings.artifact_format)?;
    let command = CommandSpec::new(ctx.binary_or(DEFAULT_TOOLBOX_BINARY), ctx.execution_dir)
        .arg(experiment)
        .arg(path.display().to_string());
    Ok(Invocation {
        command,
        artifact: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_values_follow_form_conventions() {
        assert_eq!(typed_value(&json!("on")), json!(true));
        assert_eq!(typed_value(&json!("10")), json!(10));
        assert_eq!(typed_value(&json!("0.275")), json!(0.275));
        assert_eq!(typed_value(&json!("1, 1, 1")), json!("1, 1, 1"));
        assert_eq!(typed_value(&json!("minmed")), json!("minmed"));
    }

    #[test]
    fn overlay_clears_fields_the_user_left_out() {
        let defaults = json!({
            "coarse": true,
            "General": {"Segmentix": true, "tempsave": true},
            "ComBat": {"batch": "Hospital"}
        });
        let user = json!({
            "coarse": false,
            "General": {"Segmentix": true},
            "ComBat": {}
        });
        let merged = update_overrides(
            defaults.as_object().expect("object"),
            user.as_object().expect("object"),
        );
        assert_eq!(
            Value::Object(merged),
            json!({
                "coarse": false,
                "General": {"Segmentix": true, "tempsave": false},
                "ComBat": {"batch": ""}
            })
        );
    }
}
