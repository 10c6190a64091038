use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Target of the structured progress channel read by the VRE.
pub const PROGRESS_TARGET: &str = "vre_runner::progress";
/// Target of lines forwarded from a child process.
pub const TOOL_TARGET: &str = "vre_runner::tool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Running,
    Finished,
    Warning,
    Failed,
    Cancelled,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Warning => "WARNING",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emits `"<message> - <STATUS>"` on the progress channel.
pub fn progress(message: &str, status: ProgressStatus) {
    match status {
        ProgressStatus::Running | ProgressStatus::Finished => {
            tracing::info!(target: PROGRESS_TARGET, status = status.as_str(), "{message} - {status}")
        }
        ProgressStatus::Warning | ProgressStatus::Failed | ProgressStatus::Cancelled => {
            tracing::warn!(target: PROGRESS_TARGET, status = status.as_str(), "{message} - {status}")
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

struct LogTimer;

impl FormatTime for LogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "vre_runner=debug,info"
    } else {
        "vre_runner=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(options: &LogOptions) -> std::io::Result<()> {
    let filter = env_filter(options.verbose);
    let installed = match &options.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_timer(LogTimer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(Mutex::new(file))
                        .with_filter(filter),
                )
                .try_init()
        }
        None => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(LogTimer)
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            )
            .try_init(),
    };
    installed.map_err(std::io::Error::other)
}
