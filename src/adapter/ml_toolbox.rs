use super::ToolAdapter;
use crate::config::ExitPolicy;
use crate::error::AdapterError;
use crate::invocation::toolbox::{
    build_toolbox_invocation, experiment_name, toolbox_overrides, EXPERIMENT_NAME_KEY,
};
use crate::invocation::{Invocation, InvocationContext};
use crate::job::OutputDeclaration;
use crate::metadata::Metadata;
use crate::report::{OutputMetadata, ProducedFiles};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct MlToolboxAdapter;

impl ToolAdapter for MlToolboxAdapter {
    fn name(&self) -> &'static str {
        "ml_toolbox"
    }

    fn default_exit_policy(&self) -> ExitPolicy {
        ExitPolicy::Fatal
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError> {
        build_toolbox_invocation(ctx)
    }

    // Outputs are tagged with the experiment they came from.
    fn output_metadata(
        &self,
        _output: &OutputDeclaration,
        _files: &ProducedFiles,
        base: Metadata,
        ctx: &InvocationContext<'_>,
    ) -> OutputMetadata {
        let experiment = experiment_name(&toolbox_overrides(ctx));
        OutputMetadata::Single(base.with_meta(EXPERIMENT_NAME_KEY, Value::String(experiment)))
    }
}
