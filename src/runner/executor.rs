use super::{run_process, CommandSpec, ProcessOutcome, RunControl};
use crate::config::ExecutorKind;
use crate::error::AdapterError;
use std::thread;

/// Where an external command actually runs. Adapters hand a fully built
/// [`CommandSpec`] to an executor and wait for its outcome.
pub trait TaskExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    fn execute(
        &self,
        tool: &str,
        spec: &CommandSpec,
        control: &RunControl,
    ) -> Result<ProcessOutcome, AdapterError>;
}

/// Runs the command on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

impl TaskExecutor for LocalExecutor {
    fn name(&self) -> &'static str {
        "local"
    }

    fn execute(
        &self,
        tool: &str,
        spec: &CommandSpec,
        control: &RunControl,
    ) -> Result<ProcessOutcome, AdapterError> {
        run_process(tool, spec, control)
    }
}

/// Submits the command to a dedicated worker thread and waits on its handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerThreadExecutor;

impl TaskExecutor for WorkerThreadExecutor {
    fn name(&self) -> &'static str {
        "worker_thread"
    }

    fn execute(
        &self,
        tool: &str,
        spec: &CommandSpec,
        control: &RunControl,
    ) -> Result<ProcessOutcome, AdapterError> {
        let owned_tool = tool.to_string();
        let owned_spec = spec.clone();
        let owned_control = control.clone();
        let handle = thread::Builder::new()
            .name(format!("{tool}-task"))
            .spawn(move || run_process(&owned_tool, &owned_spec, &owned_control))
            .map_err(|source| crate::error::io_error(&spec.cwd, source))?;
        handle.join().map_err(|_| {
            crate::error::io_error(
                &spec.cwd,
                std::io::Error::other(format!("{tool} worker thread panicked")),
            )
        })?
    }
}

pub fn executor_for(kind: ExecutorKind) -> Box<dyn TaskExecutor> {
    match kind {
        ExecutorKind::Local => Box::new(LocalExecutor),
        ExecutorKind::WorkerThread => Box::new(WorkerThreadExecutor),
    }
}
