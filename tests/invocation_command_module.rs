use indexmap::IndexMap;
use serde_json::{json, Value};
use std::path::Path;
use vre_runner::config::{Configuration, MaskedKeys, ToolSettings};
use vre_runner::error::AdapterError;
use vre_runner::inputs::{resolve_inputs, ResolvedInputs};
use vre_runner::invocation::command::build_shell_invocation;
use vre_runner::invocation::{expand_command, InvocationContext};
use vre_runner::job::{InputCatalog, InputRole, OutputDeclaration};
use vre_runner::metadata::Metadata;

fn template(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn inputs() -> ResolvedInputs {
    let catalog: InputCatalog = [
        ("h".to_string(), Metadata::new(Some("text"), Some("TXT"), "/data/hello.txt")),
        ("i1".to_string(), Metadata::new(Some("image"), Some("NIFTI"), "/data/i1.nii")),
        ("i2".to_string(), Metadata::new(Some("image"), Some("NIFTI"), "/data/i2.nii")),
    ]
    .into_iter()
    .collect();
    let mut roles = IndexMap::new();
    roles.insert(
        "hello_file".to_string(),
        InputRole {
            name: "hello_file".to_string(),
            identifiers: vec!["h".to_string()],
            required: true,
            allow_multiple: false,
            class: None,
        },
    );
    roles.insert(
        "images".to_string(),
        InputRole {
            name: "images".to_string(),
            identifiers: vec!["i1".to_string(), "i2".to_string()],
            required: true,
            allow_multiple: true,
            class: None,
        },
    );
    resolve_inputs(&roles, &catalog, Path::new("/runs/run001")).expect("resolve")
}

fn configuration() -> Configuration {
    let arguments: IndexMap<String, Value> =
        serde_json::from_value(json!({"username": "Alice", "threads": 2})).expect("arguments");
    Configuration::from_arguments(&arguments)
}

#[test]
fn whole_and_embedded_placeholders_expand() {
    let inputs = inputs();
    let configuration = configuration();
    let masked = MaskedKeys::default();
    let settings = ToolSettings::default();
    let outputs = vec![OutputDeclaration::new("goodbye_file").with_path("out/goodbye.txt")];
    let ctx = InvocationContext {
        tool: "shell",
        inputs: &inputs,
        configuration: &configuration,
        masked: &masked,
        outputs: &outputs,
        execution_dir: Path::new("/runs/run001"),
        settings: &settings,
    };

    let argv = expand_command(
        &template(&[
            "tool",
            "{input:hello_file}",
            "{input:images}",
            "--user={arg:username}",
            "--all={input:images}",
            "-o",
            "{output:goodbye_file}",
            "--workdir",
            "{execution}",
            "awk {print $1}",
        ]),
        &ctx,
    )
    .expect("expand");
    assert_eq!(
        argv,
        template(&[
            "tool",
            "/data/hello.txt",
            "/data/i1.nii",
            "/data/i2.nii",
            "--user=Alice",
            "--all=/data/i1.nii /data/i2.nii",
            "-o",
            "/runs/run001/out/goodbye.txt",
            "--workdir",
            "/runs/run001",
            "awk {print $1}",
        ])
    );
}

#[test]
fn unresolved_placeholder_is_missing_argument() {
    let inputs = inputs();
    let configuration = configuration();
    let masked = MaskedKeys::default();
    let settings = ToolSettings::default();
    let ctx = InvocationContext {
        tool: "shell",
        inputs: &inputs,
        configuration: &configuration,
        masked: &masked,
        outputs: &[],
        execution_dir: Path::new("/runs/run001"),
        settings: &settings,
    };

    match expand_command(&template(&["tool", "--name={arg:missing}"]), &ctx) {
        Err(AdapterError::MissingArgument { name, .. }) => assert_eq!(name, "arg:missing"),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(
        expand_command(&template(&["{output:never_declared}"]), &ctx),
        Err(AdapterError::MissingArgument { .. })
    ));
}

#[test]
fn configured_binary_takes_every_element_as_argument() {
    let inputs = inputs();
    let configuration = configuration();
    let masked = MaskedKeys::default();
    let settings = ToolSettings {
        binary: Some("/usr/bin/env".to_string()),
        command: template(&["printf", "%s", "{arg:threads}"]),
        ..ToolSettings::default()
    };
    let ctx = InvocationContext {
        tool: "shell",
        inputs: &inputs,
        configuration: &configuration,
        masked: &masked,
        outputs: &[],
        execution_dir: Path::new("/runs/run001"),
        settings: &settings,
    };

    let invocation = build_shell_invocation(&ctx).expect("build");
    assert_eq!(invocation.command.program, "/usr/bin/env");
    assert_eq!(invocation.command.args, template(&["printf", "%s", "2"]));
    assert_eq!(invocation.command.cwd, Path::new("/runs/run001"));
    assert!(invocation.artifact.is_none());
}
