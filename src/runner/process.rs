use crate::error::{io_error, AdapterError};
use crate::runner::RunControl;
use crate::shared::logging::{progress, ProgressStatus, TOOL_TARGET};
use std::collections::{BTreeMap, VecDeque};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const STDERR_TAIL_LINES: usize = 20;

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: &str, cwd: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn command_form(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Finished,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub status: ProcessStatus,
    pub elapsed: Duration,
    /// Last lines the tool wrote to stderr.
    pub stderr_tail: Vec<String>,
    pub command_form: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

fn drain_lines<R: Read + Send + 'static>(
    tool: String,
    stream: &'static str,
    source: R,
    keep: usize,
) -> Receiver<Vec<String>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut tail = VecDeque::with_capacity(keep);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(|c| c == '\n' || c == '\r');
            tracing::info!(target: TOOL_TARGET, tool = %tool, stream, "{line}");
            if keep > 0 {
                if tail.len() == keep {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
        }
        let _ = sender.send(tail.into_iter().collect());
    });
    receiver
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

// Reader threads are left to finish on their own: a grandchild that inherited
// the pipes can keep them open after the direct child is gone.
fn stop_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Cancellation or an elapsed timeout, reported on the progress channel.
fn interruption(tool: &str, start: Instant, control: &RunControl) -> Option<AdapterError> {
    if control.cancel.is_cancelled() {
        progress(
            &format!("{tool} execution cancelled"),
            ProgressStatus::Cancelled,
        );
        return Some(AdapterError::Cancelled {
            tool: tool.to_string(),
        });
    }
    let timeout = control.timeout?;
    if start.elapsed() <= timeout {
        return None;
    }
    progress(
        &format!("{tool} execution timed out"),
        ProgressStatus::Failed,
    );
    Some(AdapterError::Timeout {
        tool: tool.to_string(),
        timeout_ms: timeout.as_millis() as u64,
    })
}

// The direct child has exited, but its output is drained only once every
// holder of the pipe closes it. Timeout and cancellation still apply.
fn await_drained(
    tool: &str,
    reader: &Receiver<Vec<String>>,
    start: Instant,
    control: &RunControl,
) -> Result<Vec<String>, AdapterError> {
    loop {
        match reader.recv_timeout(control.poll_interval) {
            Ok(lines) => return Ok(lines),
            Err(RecvTimeoutError::Disconnected) => return Ok(Vec::new()),
            Err(RecvTimeoutError::Timeout) => {
                if let Some(err) = interruption(tool, start, control) {
                    tracing::warn!(tool, "tool exited but a descendant still holds its output pipes");
                    return Err(err);
                }
            }
        }
    }
}

/// Runs `spec` to completion, forwarding both output streams line by line to
/// the log while polling the child every `control.poll_interval`.
///
/// A non-zero exit is not an error here; the outcome carries the code and a
/// `Warning` status so the caller can apply its own policy. Timeout and
/// cancellation kill the child and return `Timeout` / `Cancelled`; both are
/// also honoured while waiting on output pipes that a descendant of the tool
/// keeps open. A token cancelled before launch means the tool never starts.
pub fn run_process(
    tool: &str,
    spec: &CommandSpec,
    control: &RunControl,
) -> Result<ProcessOutcome, AdapterError> {
    let command_form = spec.command_form();
    tracing::debug!(tool, command = %command_form, cwd = %spec.cwd.display(), "launching external tool");

    let mut command = Command::new(&spec.program);
    command
        .current_dir(&spec.cwd)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in &spec.env {
        command.env(k, v);
    }
    if let Some(err) = interruption(tool, Instant::now(), control) {
        return Err(err);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AdapterError::MissingBinary {
                tool: tool.to_string(),
                binary: spec.program.clone(),
            })
        }
        Err(err) => return Err(io_error(&spec.cwd, err)),
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_error(&spec.cwd, std::io::Error::other("missing stdout pipe")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io_error(&spec.cwd, std::io::Error::other("missing stderr pipe")))?;

    let stdout_reader = drain_lines(tool.to_string(), "stdout", stdout, 0);
    let stderr_reader = drain_lines(tool.to_string(), "stderr", stderr, STDERR_TAIL_LINES);

    let start = Instant::now();
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let Some(err) = interruption(tool, start, control) {
                    stop_child(&mut child);
                    return Err(err);
                }
                thread::sleep(control.poll_interval);
            }
            Err(err) => {
                stop_child(&mut child);
                return Err(io_error(&spec.cwd, err));
            }
        }
    };

    await_drained(tool, &stdout_reader, start, control)?;
    let stderr_tail = await_drained(tool, &stderr_reader, start, control)?;
    let exit_code = exit_code_of(exit_status);
    let status = if exit_status.success() {
        progress(
            &format!("{tool} execution finished successfully"),
            ProgressStatus::Finished,
        );
        ProcessStatus::Finished
    } else {
        progress(
            &format!("{tool} exited with code {exit_code}, see logs"),
            ProgressStatus::Warning,
        );
        ProcessStatus::Warning
    };

    Ok(ProcessOutcome {
        exit_code,
        status,
        elapsed: start.elapsed(),
        stderr_tail,
        command_form,
    })
}
