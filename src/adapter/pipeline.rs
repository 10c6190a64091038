use super::{adapter_for, RunState, ToolAdapter};
use crate::config::{Configuration, ExitPolicy, MaskedKeys, ToolSettings};
use crate::error::{io_error, AdapterError};
use crate::inputs::resolve_inputs;
use crate::invocation::InvocationContext;
use crate::job::{write_job_result, InputCatalog, JobDescriptor, JobResult};
use crate::report::build_job_result;
use crate::runner::{executor_for, CancelToken, TaskExecutor};
use crate::shared::logging::{progress, ProgressStatus};
use std::fs;
use std::path::Path;

/// Inputs of one adapter invocation.
#[derive(Debug, Clone, Copy)]
pub struct JobRequest<'a> {
    pub descriptor: &'a JobDescriptor,
    pub catalog: &'a InputCatalog,
    /// Directory relative `execution` values and output paths resolve against.
    pub base_dir: &'a Path,
    /// Where the result descriptor is written once reporting succeeds.
    pub result_path: Option<&'a Path>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub state: RunState,
    /// Every state entered, starting with `Created`.
    pub transitions: Vec<RunState>,
    /// Stage that was active when the run failed.
    pub failed_stage: Option<RunState>,
    pub result: Result<JobResult, AdapterError>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Succeeded
    }

    pub fn error(&self) -> Option<&AdapterError> {
        self.result.as_ref().err()
    }

    /// Single user-facing line for a failed run.
    pub fn failure_message(&self) -> Option<String> {
        let err = self.error()?;
        Some(match self.failed_stage {
            Some(stage) => format!("job failed during {stage}: {err}"),
            None => format!("job failed: {err}"),
        })
    }

    pub fn into_result(self) -> Result<JobResult, AdapterError> {
        self.result
    }

    /// A run that failed before any stage began, e.g. unreadable job files.
    pub fn rejected(err: AdapterError) -> Self {
        Self {
            state: RunState::Failed,
            transitions: vec![RunState::Created, RunState::Failed],
            failed_stage: Some(RunState::Created),
            result: Err(err),
        }
    }
}

struct StateTracker {
    state: RunState,
    transitions: Vec<RunState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: RunState::Created,
            transitions: vec![RunState::Created],
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "run state transition");
        self.state = next;
        self.transitions.push(next);
    }
}

/// Runs one job through every stage with `adapter`, never panicking and never
/// retrying. The outcome records the terminal state and, on failure, the
/// stage that raised the error.
pub fn run_job(
    adapter: &dyn ToolAdapter,
    executor: &dyn TaskExecutor,
    settings: &ToolSettings,
    cancel: &CancelToken,
    request: &JobRequest<'_>,
) -> RunOutcome {
    let mut tracker = StateTracker::new();
    let result = run_stages(adapter, executor, settings, cancel, request, &mut tracker);
    let failed_stage = match &result {
        Ok(_) => {
            tracker.advance(RunState::Succeeded);
            progress(&format!("{} job", adapter.name()), ProgressStatus::Finished);
            None
        }
        Err(err) => {
            let stage = tracker.state;
            tracker.advance(RunState::Failed);
            tracing::error!(tool = adapter.name(), stage = %stage, error = %err, "job failed");
            progress(&format!("{} job", adapter.name()), ProgressStatus::Failed);
            Some(stage)
        }
    };
    RunOutcome {
        state: tracker.state,
        transitions: tracker.transitions,
        failed_stage,
        result,
    }
}

fn run_stages(
    adapter: &dyn ToolAdapter,
    executor: &dyn TaskExecutor,
    settings: &ToolSettings,
    cancel: &CancelToken,
    request: &JobRequest<'_>,
    tracker: &mut StateTracker,
) -> Result<JobResult, AdapterError> {
    let tool = adapter.name();
    let descriptor = request.descriptor;

    tracker.advance(RunState::Validating);
    settings.validate()?;
    let configuration = Configuration::merged(&settings.defaults, &descriptor.arguments);
    let masked = MaskedKeys::with_base(
        adapter
            .masked_keys()
            .iter()
            .copied()
            .chain(settings.extra_masked_keys.iter().map(String::as_str)),
    );
    let execution_dir = configuration.execution_dir(request.base_dir);
    fs::create_dir_all(&execution_dir).map_err(|source| io_error(&execution_dir, source))?;
    tracing::debug!(tool, execution_dir = %execution_dir.display(), "execution directory ready");
    let inputs = resolve_inputs(&descriptor.inputs, request.catalog, &execution_dir)?;

    tracker.advance(RunState::BuildingInvocation);
    let ctx = InvocationContext {
        tool,
        inputs: &inputs,
        configuration: &configuration,
        masked: &masked,
        outputs: &descriptor.outputs,
        execution_dir: &execution_dir,
        settings,
    };
    let invocation = adapter.build_invocation(&ctx)?;

    tracker.advance(RunState::Executing);
    progress(&format!("Running {tool}"), ProgressStatus::Running);
    let control = settings.run_control(cancel.clone());
    let outcome = executor.execute(tool, &invocation.command, &control)?;
    tracing::info!(
        tool,
        executor = executor.name(),
        exit_code = outcome.exit_code,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "tool exited"
    );
    if !outcome.success() {
        match settings.exit_policy.unwrap_or_else(|| adapter.default_exit_policy()) {
            ExitPolicy::Fatal => {
                return Err(AdapterError::ExternalProcess {
                    tool: tool.to_string(),
                    exit_code: outcome.exit_code,
                    stderr_tail: outcome.stderr_tail.join("\n"),
                })
            }
            ExitPolicy::Warn => tracing::warn!(
                tool,
                exit_code = outcome.exit_code,
                "tool exited non-zero; reporting whatever outputs exist"
            ),
        }
    }

    tracker.advance(RunState::Reporting);
    let result = build_job_result(
        &descriptor.outputs,
        &inputs,
        settings,
        &execution_dir,
        |output, files, base| adapter.output_metadata(output, files, base, &ctx),
    )?;
    if let Some(path) = request.result_path {
        write_job_result(path, &result).map_err(AdapterError::ResultWrite)?;
        tracing::info!(path = %path.display(), entries = result.output_files.len(), "wrote job result");
    }
    Ok(result)
}

/// An adapter, an executor and fixed settings, ready to run jobs. Runs share
/// no mutable state; cancellation is scoped to the token handed to one run.
pub struct Pipeline {
    adapter: Box<dyn ToolAdapter>,
    executor: Box<dyn TaskExecutor>,
    settings: ToolSettings,
}

impl Pipeline {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            adapter: adapter_for(settings.adapter),
            executor: executor_for(settings.executor),
            settings,
        }
    }

    pub fn with_adapter(mut self, adapter: Box<dyn ToolAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn run(&self, request: &JobRequest<'_>) -> RunOutcome {
        self.run_with_cancel(request, &CancelToken::new())
    }

    /// Runs one job that stops once `cancel` is flipped. A token that is
    /// already cancelled fails the run before the tool is launched.
    pub fn run_with_cancel(&self, request: &JobRequest<'_>, cancel: &CancelToken) -> RunOutcome {
        run_job(
            self.adapter.as_ref(),
            self.executor.as_ref(),
            &self.settings,
            cancel,
            request,
        )
    }
}
