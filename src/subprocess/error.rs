use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("Process exited with code {0}")]
    ExitCode(i32),

    #[error("Process terminated by signal {0}")]
    Signal(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream unavailable: {0}")]
    Stream(String),
}

impl ProcessError {
    /// Numeric code reported to the controller for a failed operation: the
    /// exit code itself, 128 + signal for signal deaths, -1 for failures
    /// that never produced an exit status.
    pub fn notification_code(&self) -> i32 {
        match self {
            ProcessError::ExitCode(code) => *code,
            ProcessError::Signal(signal) => 128 + signal,
            _ => -1,
        }
    }
}
