pub mod control;
pub mod executor;
pub mod process;

pub use control::{CancelToken, RunControl, DEFAULT_POLL_INTERVAL_MS};
pub use executor::{executor_for, LocalExecutor, TaskExecutor, WorkerThreadExecutor};
pub use process::{run_process, CommandSpec, ProcessOutcome, ProcessStatus};
