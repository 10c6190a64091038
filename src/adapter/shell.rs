use super::ToolAdapter;
use crate::config::ExitPolicy;
use crate::error::AdapterError;
use crate::invocation::command::build_shell_invocation;
use crate::invocation::{Invocation, InvocationContext};

/// Runs an arbitrary command built from the `command` template in settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellAdapter;

impl ToolAdapter for ShellAdapter {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn default_exit_policy(&self) -> ExitPolicy {
        ExitPolicy::Fatal
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError> {
        build_shell_invocation(ctx)
    }
}
