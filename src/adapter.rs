pub mod cwl;
pub mod ml_toolbox;
pub mod pipeline;
pub mod shell;
pub mod state;

pub use cwl::CwlAdapter;
pub use ml_toolbox::MlToolboxAdapter;
pub use pipeline::{run_job, JobRequest, Pipeline, RunOutcome};
pub use shell::ShellAdapter;
pub use state::RunState;

use crate::config::{AdapterKind, ExitPolicy};
use crate::error::AdapterError;
use crate::invocation::{Invocation, InvocationContext};
use crate::job::OutputDeclaration;
use crate::metadata::Metadata;
use crate::report::{OutputMetadata, ProducedFiles};

/// One external tool behind the uniform run contract. Implementations differ
/// only in how the invocation is built and how output metadata is shaped.
pub trait ToolAdapter: Send + Sync {
    /// Label used in logs, progress lines and errors.
    fn name(&self) -> &'static str;

    /// Configuration keys reserved for this adapter, on top of the keys every
    /// adapter masks.
    fn masked_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_exit_policy(&self) -> ExitPolicy;

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError>;

    fn output_metadata(
        &self,
        _output: &OutputDeclaration,
        _files: &ProducedFiles,
        base: Metadata,
        _ctx: &InvocationContext<'_>,
    ) -> OutputMetadata {
        OutputMetadata::Single(base)
    }
}

pub fn adapter_for(kind: AdapterKind) -> Box<dyn ToolAdapter> {
    match kind {
        AdapterKind::Cwl => Box::new(CwlAdapter),
        AdapterKind::Shell => Box::new(ShellAdapter),
        AdapterKind::MlToolbox => Box::new(MlToolboxAdapter),
    }
}
