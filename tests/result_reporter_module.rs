use indexmap::IndexMap;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use vre_runner::config::{FixedOutputType, ToolSettings};
use vre_runner::error::{AdapterError, ErrorKind};
use vre_runner::inputs::{resolve_inputs, ResolvedInputs};
use vre_runner::job::{InputCatalog, InputRole, OutputDeclaration};
use vre_runner::metadata::Metadata;
use vre_runner::report::{build_job_result, locate_output, OutputMetadata, ProducedFiles};

fn two_inputs(exec: &Path) -> ResolvedInputs {
    let catalog: InputCatalog = [
        ("a".to_string(), Metadata::new(Some("sequence_dna"), Some("FASTQ"), "/data/a.fq")),
        ("b".to_string(), Metadata::new(Some("reference"), Some("FASTA"), "/data/b.fa")),
    ]
    .into_iter()
    .collect();
    let mut roles = IndexMap::new();
    for (name, id) in [("reads", "a"), ("genome", "b")] {
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
    resolve_inputs(&roles, &catalog, exec).expect("resolve")
}

fn shared_metadata(
    _: &OutputDeclaration,
    _: &ProducedFiles,
    base: Metadata,
) -> OutputMetadata {
    OutputMetadata::Single(base)
}

#[test]
fn missing_required_output_names_the_role() {
    let dir = tempdir().expect("tempdir");
    let outputs = vec![OutputDeclaration::new("out").with_path("out.txt")];
    let err = build_job_result(
        &outputs,
        &two_inputs(dir.path()),
        &ToolSettings::default(),
        dir.path(),
        shared_metadata,
    )
    .expect_err("missing output");
    match err {
        AdapterError::MissingOutput { role, path } => {
            assert_eq!(role, "out");
            assert_eq!(path, dir.path().join("out.txt").display().to_string());
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn present_output_reports_absolute_path_and_full_provenance() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("out.txt"), "done").expect("write output");
    let mut declared = OutputDeclaration::new("out").with_path("./out.txt");
    declared.data_type = Some("report".to_string());
    declared.file_type = Some("TXT".to_string());
    declared.meta_data.insert("visible".to_string(), json!(true));

    let result = build_job_result(
        &[declared],
        &two_inputs(dir.path()),
        &ToolSettings::default(),
        dir.path(),
        shared_metadata,
    )
    .expect("report");
    assert_eq!(result.output_files.len(), 1);
    let entry = &result.output_files[0];
    assert_eq!(entry.file_path, dir.path().join("out.txt").display().to_string());
    assert!(Path::new(&entry.file_path).is_absolute());
    assert_eq!(entry.data_type.as_deref(), Some("report"));
    assert_eq!(entry.sources, vec!["/data/a.fq".to_string(), "/data/b.fa".to_string()]);
    assert_eq!(entry.meta_data.get("visible"), Some(&json!(true)));
}

#[test]
fn optional_missing_output_is_omitted() {
    let dir = tempdir().expect("tempdir");
    let mut optional = OutputDeclaration::new("log").with_path("tool.log");
    optional.required = false;
    let unpathed = OutputDeclaration {
        required: false,
        ..OutputDeclaration::new("extra")
    };

    let result = build_job_result(
        &[optional, unpathed],
        &two_inputs(dir.path()),
        &ToolSettings::default(),
        dir.path(),
        shared_metadata,
    )
    .expect("report");
    assert!(result.output_files.is_empty());
}

#[test]
fn directory_output_expands_sorted_and_fixed_types_apply() {
    let dir = tempdir().expect("tempdir");
    let bams = dir.path().join("bams");
    fs::create_dir_all(bams.join("nested")).expect("mkdir");
    for name in ["c.bam", "a.bam", "b.bam"] {
        fs::write(bams.join(name), name).expect("write bam");
    }
    let mut declared = OutputDeclaration::new("bam_files").with_path("bams");
    declared.allow_multiple = true;
    let settings = ToolSettings {
        fixed_output_type: Some(FixedOutputType {
            data_type: "sequence_dna".to_string(),
            file_type: "BAM".to_string(),
        }),
        ..ToolSettings::default()
    };

    let located = locate_output(&declared, dir.path()).expect("locate");
    assert_eq!(located.as_ref().map(ProducedFiles::len), Some(3));

    let result = build_job_result(
        &[declared],
        &two_inputs(dir.path()),
        &settings,
        dir.path(),
        shared_metadata,
    )
    .expect("report");
    let names: Vec<_> = result
        .output_files
        .iter()
        .map(|entry| {
            Path::new(&entry.file_path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    assert_eq!(names, vec!["a.bam", "b.bam", "c.bam"]);
    assert!(result
        .output_files
        .iter()
        .all(|entry| entry.file_type.as_deref() == Some("BAM")
            && entry.data_type.as_deref() == Some("sequence_dna")
            && entry.name == "bam_files"));
}

#[test]
fn per_file_metadata_count_mismatch_fails() {
    let dir = tempdir().expect("tempdir");
    let bams = dir.path().join("bams");
    fs::create_dir_all(&bams).expect("mkdir");
    for name in ["a.bam", "b.bam", "c.bam"] {
        fs::write(bams.join(name), name).expect("write bam");
    }
    let mut declared = OutputDeclaration::new("bam_files").with_path("bams");
    declared.allow_multiple = true;

    let err = build_job_result(
        &[declared],
        &two_inputs(dir.path()),
        &ToolSettings::default(),
        dir.path(),
        |_, _, base| OutputMetadata::PerFile(vec![base.clone(), base]),
    )
    .expect_err("mismatch");
    assert_eq!(err.kind(), ErrorKind::MetadataCountMismatch);
}
