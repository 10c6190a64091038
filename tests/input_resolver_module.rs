use indexmap::IndexMap;
use std::path::Path;
use vre_runner::error::AdapterError;
use vre_runner::inputs::{resolve_inputs, Binding, PathBinding};
use vre_runner::job::{InputCatalog, InputRole};
use vre_runner::metadata::Metadata;

fn catalog(entries: &[(&str, &str)]) -> InputCatalog {
    entries
        .iter()
        .map(|(id, path)| {
            (
                id.to_string(),
                Metadata::new(Some("image"), Some("NIFTI"), *path),
            )
        })
        .collect()
}

fn roles(list: Vec<InputRole>) -> IndexMap<String, InputRole> {
    list.into_iter().map(|role| (role.name.clone(), role)).collect()
}

fn role(name: &str, ids: &[&str], allow_multiple: bool) -> InputRole {
    InputRole {
        name: name.to_string(),
        identifiers: ids.iter().map(|id| id.to_string()).collect(),
        required: true,
        allow_multiple,
        class: None,
    }
}

#[test]
fn multi_valued_role_keeps_identifier_order() {
    let catalog = catalog(&[("c", "/data/c.nii"), ("a", "/data/a.nii"), ("b", "/data/b.nii")]);
    let roles = roles(vec![role("segmentations", &["b", "c", "a"], true)]);

    let resolved = resolve_inputs(&roles, &catalog, Path::new("/runs/1")).expect("resolve");
    let bound = resolved.get("segmentations").expect("role");
    match &bound.binding {
        Binding::Multiple(records) => {
            let paths: Vec<_> = records.iter().map(|r| r.file_path.as_str()).collect();
            assert_eq!(paths, vec!["/data/b.nii", "/data/c.nii", "/data/a.nii"]);
        }
        other => panic!("expected multiple binding, got {other:?}"),
    }
}

#[test]
fn single_role_projects_plain_path_and_sources_follow_role_order() {
    let catalog = catalog(&[("img", "/data/img.nii"), ("lbl", "/data/labels.csv")]);
    let roles = roles(vec![
        role("label_file", &["lbl"], false),
        role("images", &["img"], false),
    ]);

    let resolved = resolve_inputs(&roles, &catalog, Path::new("/runs/1")).expect("resolve");
    let paths = resolved.paths();
    assert_eq!(
        paths.get("label_file"),
        Some(&PathBinding::One("/data/labels.csv".to_string()))
    );
    assert_eq!(
        paths.get("images"),
        Some(&PathBinding::Many(vec!["/data/img.nii".to_string()]))
    );
    assert_eq!(
        resolved.source_paths(),
        vec!["/data/labels.csv".to_string(), "/data/img.nii".to_string()]
    );
}

#[test]
fn unknown_identifier_is_unresolved_reference() {
    let catalog = catalog(&[("known", "/data/k")]);
    let roles = roles(vec![role("images", &["known", "missing"], true)]);

    match resolve_inputs(&roles, &catalog, Path::new("/runs/1")) {
        Err(AdapterError::UnresolvedReference { role, identifier }) => {
            assert_eq!(role, "images");
            assert_eq!(identifier, "missing");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn required_role_without_identifier_fails() {
    let roles = roles(vec![role("hello_file", &[], false)]);
    assert!(matches!(
        resolve_inputs(&roles, &InputCatalog::new(), Path::new("/runs/1")),
        Err(AdapterError::UnresolvedReference { .. })
    ));
}
