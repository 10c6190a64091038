use super::ToolAdapter;
use crate::config::ExitPolicy;
use crate::error::AdapterError;
use crate::invocation::workflow::build_workflow_invocation;
use crate::invocation::{Invocation, InvocationContext, WORKFLOW_TAG_KEY, WORKFLOW_URL_KEY};

/// Runs a remote CWL workflow through `cwltool`.
///
/// A non-zero exit only warns by default: the engine often exits non-zero
/// after producing usable outputs, so reporting still runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CwlAdapter;

impl ToolAdapter for CwlAdapter {
    fn name(&self) -> &'static str {
        "cwl"
    }

    fn masked_keys(&self) -> &'static [&'static str] {
        &[WORKFLOW_URL_KEY, WORKFLOW_TAG_KEY]
    }

    fn default_exit_policy(&self) -> ExitPolicy {
        ExitPolicy::Warn
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError> {
        build_workflow_invocation(ctx)
    }
}
