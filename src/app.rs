use crate::adapter::{JobRequest, Pipeline, RunOutcome};
use crate::config::ToolSettings;
use crate::error::AdapterError;
use crate::job::{read_input_catalog, read_job_descriptor};
use crate::shared::paths::resolve_against;
use std::path::PathBuf;

/// File locations for one VRE job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPaths {
    /// Job descriptor (`config.json`).
    pub config: PathBuf,
    /// Input catalog (`in_metadata.json`).
    pub in_metadata: PathBuf,
    /// Result descriptor to write (`out_metadata.json`).
    pub out_metadata: PathBuf,
    /// Directory every relative path resolves against.
    pub base_dir: PathBuf,
}

/// Reads the job files, runs the configured adapter, and writes the result
/// descriptor. The result file exists afterwards only if the run succeeded.
pub fn launch(paths: &LaunchPaths, settings: ToolSettings) -> RunOutcome {
    launch_with(&Pipeline::new(settings), paths)
}

pub fn launch_with(pipeline: &Pipeline, paths: &LaunchPaths) -> RunOutcome {
    let config = resolve_against(&paths.base_dir, &paths.config);
    let in_metadata = resolve_against(&paths.base_dir, &paths.in_metadata);
    let out_metadata = resolve_against(&paths.base_dir, &paths.out_metadata);

    tracing::info!(
        adapter = pipeline.adapter_name(),
        config = %config.display(),
        in_metadata = %in_metadata.display(),
        "unpacking job description"
    );
    let descriptor = match read_job_descriptor(&config) {
        Ok(descriptor) => descriptor,
        Err(err) => return reject(AdapterError::MalformedConfig(err)),
    };
    let catalog = match read_input_catalog(&in_metadata) {
        Ok(catalog) => catalog,
        Err(err) => return reject(AdapterError::MalformedConfig(err)),
    };

    pipeline.run(&JobRequest {
        descriptor: &descriptor,
        catalog: &catalog,
        base_dir: &paths.base_dir,
        result_path: Some(&out_metadata),
    })
}

fn reject(err: AdapterError) -> RunOutcome {
    tracing::error!(error = %err, "job files could not be read");
    RunOutcome::rejected(err)
}
