use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::command::ProcessCommand;
use super::error::ProcessError;

/// How a spawned process's standard streams are wired.
///
/// `pipe_stdin` / `pipe_stdout` reserve the stream as a pipe end for
/// [`connect`](super::pipeline::connect). `capture_output` accumulates the
/// remaining output streams into buffers that are logged in full at EOF;
/// with everything false, output goes straight to the agent's own console.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnOptions {
    pub pipe_stdin: bool,
    pub pipe_stdout: bool,
    pub capture_output: bool,
}

impl SpawnOptions {
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn capture() -> Self {
        Self {
            capture_output: true,
            ..Self::default()
        }
    }
}

/// A terminal lifecycle event observed for a child process.
#[derive(Debug)]
pub enum ProcessEvent {
    Exited {
        code: Option<i32>,
        signal: Option<i32>,
    },
    Error(std::io::Error),
}

impl ProcessEvent {
    pub fn from_exit_status(status: std::process::ExitStatus) -> Self {
        ProcessEvent::Exited {
            code: status.code(),
            signal: Self::signal_of(status),
        }
    }

    #[cfg(unix)]
    fn signal_of(status: std::process::ExitStatus) -> Option<i32> {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    }

    #[cfg(not(unix))]
    fn signal_of(_status: std::process::ExitStatus) -> Option<i32> {
        None
    }
}

/// Single-resolution outcome of one supervised process: the first terminal
/// event commits the outcome, later events are logged and discarded.
pub struct OutcomeCell {
    label: String,
    outcome: Option<Result<i32, ProcessError>>,
}

impl OutcomeCell {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outcome: None,
        }
    }

    /// Log the event, then fold it into the outcome if none is committed
    /// yet. Returns whether this event resolved the cell.
    pub fn observe(&mut self, event: ProcessEvent) -> bool {
        match &event {
            ProcessEvent::Exited { code, signal } => {
                info!(
                    "Process '{}' exited: code {:?}, signal {:?}",
                    self.label, code, signal
                );
            }
            ProcessEvent::Error(err) => {
                error!("Process '{}' supervision error: {}", self.label, err);
            }
        }

        if self.outcome.is_some() {
            warn!(
                "Process '{}': ignoring event after outcome already resolved",
                self.label
            );
            return false;
        }

        self.outcome = Some(match event {
            ProcessEvent::Exited { code: Some(0), .. } => Ok(0),
            ProcessEvent::Exited {
                code: Some(code), ..
            } => Err(ProcessError::ExitCode(code)),
            ProcessEvent::Exited {
                code: None,
                signal: Some(signal),
            } => Err(ProcessError::Signal(signal)),
            ProcessEvent::Exited {
                code: None,
                signal: None,
            } => Err(ProcessError::ExitCode(-1)),
            ProcessEvent::Error(err) => Err(ProcessError::Io(err)),
        });
        true
    }

    pub fn outcome(&self) -> Option<&Result<i32, ProcessError>> {
        self.outcome.as_ref()
    }

    pub fn take(&mut self) -> Option<Result<i32, ProcessError>> {
        self.outcome.take()
    }
}

/// Owns exactly one spawned child process for its lifetime, together with
/// the capture tasks draining its output streams and the cell holding its
/// outcome.
pub struct ProcessHandle {
    label: String,
    child: Child,
    outcome: OutcomeCell,
    capture_tasks: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
    pub fn spawn(
        command: ProcessCommand,
        options: SpawnOptions,
    ) -> Result<Self, ProcessError> {
        let label = command.display();
        info!("Executing: '{}'", label);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        cmd.stdin(if options.pipe_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(if options.pipe_stdout || options.capture_output {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(if options.capture_output {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        let mut child = cmd
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command))?;

        let mut capture_tasks = Vec::new();
        if options.capture_output {
            if !options.pipe_stdout {
                if let Some(stdout) = child.stdout.take() {
                    capture_tasks.push(Self::capture_stream(label.clone(), "stdout", stdout));
                }
            }
            if let Some(stderr) = child.stderr.take() {
                capture_tasks.push(Self::capture_stream(label.clone(), "stderr", stderr));
            }
        }

        Ok(Self {
            outcome: OutcomeCell::new(label.clone()),
            label,
            child,
            capture_tasks,
        })
    }

    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        error!("Failed to spawn '{}': {}", command.display(), error);
        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            }
        }
    }

    /// Drain a captured stream to a buffer and log it in full at EOF. The
    /// buffer is diagnostic only and never reaches the outcome.
    fn capture_stream<R>(label: String, stream_name: &'static str, mut stream: R) -> JoinHandle<()>
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        tokio::spawn(async move {
            let mut buffer = Vec::new();
            match stream.read_to_end(&mut buffer).await {
                Ok(_) => {
                    if buffer.is_empty() {
                        debug!("Process '{}': {} closed with no output", label, stream_name);
                    } else {
                        info!(
                            "Process '{}': captured {} ({} bytes):\n{}",
                            label,
                            stream_name,
                            buffer.len(),
                            String::from_utf8_lossy(&buffer).trim_end()
                        );
                    }
                }
                Err(e) => {
                    warn!("Process '{}': failed reading {}: {}", label, stream_name, e);
                }
            }
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Take the piped stdout end for connection to a consumer. Fails when
    /// the stream was not piped or is already connected.
    pub fn take_stdout(&mut self) -> Result<ChildStdout, ProcessError> {
        self.child.stdout.take().ok_or_else(|| {
            ProcessError::Stream(format!("stdout of '{}' is not available", self.label))
        })
    }

    /// Take the piped stdin end for connection to a producer.
    pub fn take_stdin(&mut self) -> Result<ChildStdin, ProcessError> {
        self.child.stdin.take().ok_or_else(|| {
            ProcessError::Stream(format!("stdin of '{}' is not available", self.label))
        })
    }

    /// Drop any pipe ends still held by the agent so the child observes
    /// EOF (stdin) or EPIPE (stdout) instead of blocking on a peer that
    /// never arrived.
    pub fn release_pipes(&mut self) {
        if self.child.stdin.take().is_some() {
            debug!("Process '{}': released unconnected stdin pipe", self.label);
        }
        if self.child.stdout.take().is_some() {
            debug!("Process '{}': released unconnected stdout pipe", self.label);
        }
    }

    /// Wait for the process to terminate and deliver its outcome. Waits for
    /// the capture tasks as well, so captured output is fully logged by the
    /// time the outcome is returned.
    pub async fn wait(mut self) -> Result<i32, ProcessError> {
        let event = match self.child.wait().await {
            Ok(status) => ProcessEvent::from_exit_status(status),
            Err(e) => ProcessEvent::Error(e),
        };
        self.outcome.observe(event);

        for task in self.capture_tasks {
            let _ = task.await;
        }

        match self.outcome.take() {
            Some(outcome) => outcome,
            None => Err(ProcessError::Io(std::io::Error::other(
                "no terminal event observed",
            ))),
        }
    }
}
