//! Common test utilities and helpers

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use zfs_backup_agent::config::AgentConfig;
use zfs_backup_agent::notify::{Notifier, NotifyError};

/// A fake zfs/mbuffer toolchain in a temp dir. Each stub appends its argv
/// to `<name>.log` so tests can assert the exact command lines the agent
/// produced, then exits with a fixed code.
pub struct StubToolchain {
    temp_dir: TempDir,
}

impl StubToolchain {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Install a stub executable that records its argv and exits with
    /// `exit_code`.
    pub fn install(&self, name: &str, exit_code: i32) -> PathBuf {
        self.install_script(
            name,
            &format!(
                "#!/bin/sh\necho \"$@\" >> \"{log}\"\nexit {code}\n",
                log = self.log_path(name).display(),
                code = exit_code,
            ),
        )
    }

    /// Install a stub that records its argv, sleeps, then exits cleanly.
    /// Used to observe the window between acknowledgment and completion.
    pub fn install_slow(&self, name: &str, seconds: u32) -> PathBuf {
        self.install_script(
            name,
            &format!(
                "#!/bin/sh\necho \"$@\" >> \"{log}\"\nsleep {seconds}\nexit 0\n",
                log = self.log_path(name).display(),
            ),
        )
    }

    pub fn install_script(&self, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.temp_dir.path().join(name);
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(format!("{name}.log"))
    }

    /// The argv lines recorded by a stub, one per invocation.
    pub fn recorded_args(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.log_path(name))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Agent config pointing at the stub toolchain.
    pub fn config(&self) -> AgentConfig {
        AgentConfig {
            zfs_program: self.temp_dir.path().join("zfs").display().to_string(),
            mbuffer_program: self.temp_dir.path().join("mbuffer").display().to_string(),
            ..AgentConfig::default()
        }
    }
}

/// Records every notification instead of calling a controller.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(String, i32)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, i32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, job_id: &str, code: i32) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push((job_id.to_string(), code));
        Ok(())
    }
}

/// Fails every notification, for asserting that notification errors are
/// swallowed.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _job_id: &str, _code: i32) -> Result<(), NotifyError> {
        Err(NotifyError::HttpStatus(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}
