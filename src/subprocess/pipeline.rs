use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::command::ProcessCommand;
use super::error::ProcessError;
use super::handle::{ProcessHandle, SpawnOptions};

/// Which end of a two-process pipeline the transfer tool occupies. The
/// transfer tool is always the primary: its outcome is the pipeline's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryRole {
    /// Primary produces the byte stream (send path).
    Producer,
    /// Primary consumes the byte stream (receive path).
    Consumer,
}

/// Result of a two-process pipeline. `outcome` is the primary process's
/// outcome, unchanged. `secondary` records how the buffering process fared;
/// it is diagnostic only and never alters `outcome`.
#[derive(Debug)]
pub struct PipelineReport {
    pub outcome: Result<i32, ProcessError>,
    pub secondary: Option<Result<i32, ProcessError>>,
}

/// Run a single process to completion with its output on the agent's own
/// console. Used for snapshot create/destroy.
pub async fn run_single(command: ProcessCommand) -> Result<i32, ProcessError> {
    let handle = ProcessHandle::spawn(command, SpawnOptions::inherit())?;
    handle.wait().await
}

/// Connect a producer's stdout to a consumer's stdin, byte for byte, with
/// no buffering beyond the OS pipe. Each handle keeps ownership of its own
/// process; only the pipe ends move into the relay task. The consumer's
/// stdin is closed once the producer's stream ends.
pub fn connect(
    producer: &mut ProcessHandle,
    consumer: &mut ProcessHandle,
) -> Result<JoinHandle<()>, ProcessError> {
    let mut stdout = producer.take_stdout()?;
    let mut stdin = consumer.take_stdin()?;
    let label = format!("'{}' -> '{}'", producer.label(), consumer.label());

    Ok(tokio::spawn(async move {
        match tokio::io::copy(&mut stdout, &mut stdin).await {
            Ok(bytes) => debug!("Pipe {} relayed {} bytes", label, bytes),
            Err(e) => warn!("Pipe {} failed: {}", label, e),
        }
        if let Err(e) = stdin.shutdown().await {
            debug!("Pipe {}: closing consumer stdin failed: {}", label, e);
        }
    }))
}

fn primary_options(role: PrimaryRole) -> SpawnOptions {
    match role {
        // Producer's stdout feeds the pipe; stderr stays on the console.
        PrimaryRole::Producer => SpawnOptions {
            pipe_stdout: true,
            ..SpawnOptions::inherit()
        },
        // Consumer reads the pipe; stdout/stderr stay on the console for
        // live operator visibility (receive path asymmetry).
        PrimaryRole::Consumer => SpawnOptions {
            pipe_stdin: true,
            ..SpawnOptions::inherit()
        },
    }
}

fn secondary_options(role: PrimaryRole) -> SpawnOptions {
    match role {
        // Secondary consumes what the primary produces; everything it
        // prints is captured and logged.
        PrimaryRole::Producer => SpawnOptions {
            pipe_stdin: true,
            ..SpawnOptions::capture()
        },
        // Secondary produces the byte stream on stdout; its stderr is
        // captured and logged.
        PrimaryRole::Consumer => SpawnOptions {
            pipe_stdout: true,
            ..SpawnOptions::capture()
        },
    }
}

/// Run a transfer-tool/buffer-tool pair wired producer-to-consumer. The
/// primary (transfer tool) outcome decides the pipeline; a secondary
/// failure is logged and reported only through [`PipelineReport::secondary`].
pub async fn run_pair(
    primary: ProcessCommand,
    secondary: ProcessCommand,
    primary_role: PrimaryRole,
) -> PipelineReport {
    let mut primary_handle = match ProcessHandle::spawn(primary, primary_options(primary_role)) {
        Ok(handle) => handle,
        Err(e) => {
            return PipelineReport {
                outcome: Err(e),
                secondary: None,
            }
        }
    };

    let mut secondary_handle = None;
    let mut secondary_spawn_error = None;
    match ProcessHandle::spawn(secondary, secondary_options(primary_role)) {
        Ok(handle) => secondary_handle = Some(handle),
        Err(e) => {
            warn!("Secondary pipeline process failed to launch: {}", e);
            secondary_spawn_error = Some(Err(e));
        }
    }

    let relay = match secondary_handle.as_mut() {
        Some(secondary) => {
            let wired = match primary_role {
                PrimaryRole::Producer => connect(&mut primary_handle, secondary),
                PrimaryRole::Consumer => connect(secondary, &mut primary_handle),
            };
            match wired {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("Pipeline stream connection failed: {}", e);
                    primary_handle.release_pipes();
                    secondary.release_pipes();
                    None
                }
            }
        }
        None => {
            // Without a peer the primary must see EOF/EPIPE rather than
            // block on a pipe nobody holds.
            primary_handle.release_pipes();
            None
        }
    };

    let (outcome, secondary) = match secondary_handle {
        Some(secondary) => {
            let (primary_outcome, secondary_outcome) =
                tokio::join!(primary_handle.wait(), secondary.wait());
            (primary_outcome, Some(secondary_outcome))
        }
        None => (primary_handle.wait().await, secondary_spawn_error),
    };

    if let Some(task) = relay {
        let _ = task.await;
    }

    match &secondary {
        Some(Ok(code)) => info!("Secondary pipeline process finished with code {}", code),
        Some(Err(e)) => warn!(
            "Secondary pipeline process failed: {} (primary outcome stands)",
            e
        ),
        None => {}
    }

    PipelineReport { outcome, secondary }
}
