use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::fs;
use tempfile::tempdir;
use vre_runner::config::{ArtifactFormat, Configuration, MaskedKeys, ToolSettings};
use vre_runner::inputs::resolve_inputs;
use vre_runner::invocation::{
    build_toolbox_invocation, parse_user_arguments, update_overrides, InvocationContext,
};
use vre_runner::job::{InputCatalog, InputRole};
use vre_runner::metadata::Metadata;

fn form_arguments() -> Configuration {
    let arguments: IndexMap<String, Value> = [
        ("execution", json!("/runs/run029")),
        ("project", json!("/runs")),
        ("description", json!(null)),
        ("General:General:Segmentix", json!("on")),
        ("General:General:Imagetype", json!("MRI")),
        ("image:Preprocessing:Method", json!("minmed")),
        ("image:Preprocessing:Clipping_Range", json!("-1000.0, 3001.0")),
        ("image:Preprocessing:Resampling_spacing", json!("1, 1, 1")),
        ("selection:Featsel:Variance", json!("1.0")),
        ("arguments_ML:ML:mode", json!("multiclass_classification")),
        ("classifiers:classifiers:SVM", json!("on")),
        ("classifiers:classifiers:RF", json!("on")),
        ("CrossValidation:CrossValidation:N_iterations", json!("10")),
        ("HyperOptimization:HyperOptimization:test_size", json!("0.2")),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();
    Configuration::from_arguments(&arguments)
}

#[test]
fn form_keys_fold_into_sections() {
    let parsed = parse_user_arguments(&form_arguments(), &MaskedKeys::base());

    assert_eq!(parsed.get("modus"), Some(&json!("multiclass_classification")));
    assert_eq!(parsed.get("image_types"), Some(&json!("MRI")));
    assert_eq!(parsed.get("coarse"), Some(&json!(false)));
    assert_eq!(parsed.get("experiment_name"), Some(&json!("run000")));
    assert_eq!(parsed["General"], json!({"Segmentix": true}));
    assert_eq!(parsed["Preprocessing"]["Method"], json!("minmed"));
    assert_eq!(parsed["Preprocessing"]["Clipping_Range"], json!("-1000.0, 3001.0"));
    assert_eq!(parsed["Preprocessing"]["Resampling_spacing"], json!("1, 1, 1"));
    assert_eq!(parsed["Featsel"]["Variance"], json!(1.0));
    assert_eq!(parsed["Classification"]["classifiers"], json!("SVM, RF"));
    assert_eq!(parsed["CrossValidation"]["N_iterations"], json!(10));
    assert_eq!(parsed["HyperOptimization"]["test_size"], json!(0.2));
    assert!(parsed.get("execution").is_none());
}

#[test]
fn overlay_uses_section_defaults() {
    let defaults = json!({
        "modus": "binary_classification",
        "coarse": true,
        "experiment_name": "run000",
        "image_types": "CT",
        "General": {"Segmentix": true, "tempsave": true, "ComBat": false},
        "Preprocessing": {"Method": "z_score", "Clipping": true}
    });
    let parsed = parse_user_arguments(&form_arguments(), &MaskedKeys::base());
    let merged = update_overrides(defaults.as_object().expect("object"), &parsed);

    assert_eq!(merged["modus"], json!("multiclass_classification"));
    assert_eq!(merged["coarse"], json!(false));
    assert_eq!(
        merged["General"],
        json!({"Segmentix": true, "tempsave": false, "ComBat": false})
    );
    assert_eq!(merged["Preprocessing"]["Method"], json!("minmed"));
    assert_eq!(merged["Preprocessing"]["Clipping"], json!(false));
}

#[test]
fn toolbox_artifact_lists_images_and_label_file() {
    let dir = tempdir().expect("tempdir");
    let catalog: InputCatalog = [
        ("img".to_string(), Metadata::new(Some("image"), Some("NIFTI"), "/data/p1/image.nii.gz")),
        ("seg".to_string(), Metadata::new(Some("mask"), Some("NIFTI"), "/data/p1/mask.nii.gz")),
        ("lbl".to_string(), Metadata::new(Some("labels"), Some("TXT"), "/data/pinfo.txt")),
    ]
    .into_iter()
    .collect();
    let mut roles = IndexMap::new();
    for (name, id) in [("images", "img"), ("segmentations", "seg"), ("label_file", "lbl")] {
        roles.insert(
            name.to_string(),
            InputRole {
                name: name.to_string(),
                identifiers: vec![id.to_string()],
                required: true,
                allow_multiple: false,
                class: None,
            },
        );
    }
    let inputs = resolve_inputs(&roles, &catalog, dir.path()).expect("resolve");
    let configuration = form_arguments();
    let masked = MaskedKeys::base();
    let settings = ToolSettings {
        artifact_format: ArtifactFormat::Json,
        ..ToolSettings::default()
    };
    let ctx = InvocationContext {
        tool: "ml_toolbox",
        inputs: &inputs,
        configuration: &configuration,
        masked: &masked,
        outputs: &[],
        execution_dir: dir.path(),
        settings: &settings,
    };

    let invocation = build_toolbox_invocation(&ctx).expect("build");
    let artifact = invocation.artifact.expect("artifact");
    assert_eq!(invocation.command.program, "ml_toolbox");
    assert_eq!(invocation.command.args[0], "run000");
    assert_eq!(invocation.command.args[1], artifact.display().to_string());

    let written: Map<String, Value> =
        serde_json::from_str(&fs::read_to_string(&artifact).expect("read")).expect("json");
    assert_eq!(written["images"], json!(["/data/p1/image.nii.gz"]));
    assert_eq!(written["segmentations"], json!(["/data/p1/mask.nii.gz"]));
    assert_eq!(written["label_file"], json!("/data/pinfo.txt"));
    assert_eq!(written["out_dir"], json!(dir.path().display().to_string()));
    assert_eq!(written["overrides"]["image_types"], json!("MRI"));
}
