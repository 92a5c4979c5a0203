//! The four public operations: snapshot create/destroy run to completion;
//! send/receive acknowledge immediately, run as detached pipelines, and
//! report their real outcome through the deferred controller notification.

pub mod request;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::commands;
use crate::config::AgentConfig;
use crate::notify::{HttpNotifier, NoopNotifier, Notifier};
use crate::subprocess::{
    run_pair, run_single, PipelineReport, PrimaryRole, ProcessCommand, ProcessError,
};
use request::{
    CreateSnapshotRequest, DestroySnapshotRequest, ReceiveSnapshotRequest, RequestError,
    SendSnapshotRequest,
};

pub struct ZfsApi {
    config: AgentConfig,
    notifier: Arc<dyn Notifier>,
}

impl ZfsApi {
    pub fn new(config: AgentConfig) -> Self {
        let notifier: Arc<dyn Notifier> = match &config.controller_api_url {
            Some(url) => Arc::new(HttpNotifier::new(url.clone())),
            None => Arc::new(NoopNotifier),
        };
        Self { config, notifier }
    }

    pub fn with_notifier(config: AgentConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Create a snapshot and wait for the tool to finish. Exit codes and
    /// failures propagate unchanged.
    pub async fn create_snapshot(
        &self,
        request: &CreateSnapshotRequest,
    ) -> Result<i32, ProcessError> {
        info!("Creating snapshot: {}", request.snapshot_name);
        run_single(commands::snapshot_command(&self.config, request)).await
    }

    /// Destroy a snapshot and wait for the tool to finish.
    pub async fn destroy_snapshot(
        &self,
        request: &DestroySnapshotRequest,
    ) -> Result<i32, ProcessError> {
        info!("Destroying snapshot: {}", request.snapshot_name);
        run_single(commands::destroy_command(&self.config, request)).await
    }

    /// Start a send pipeline: `zfs send` producing into an outbound mbuffer.
    /// Returns as soon as the pipeline task is launched; the outcome reaches
    /// the controller through the deferred notification. The join handle
    /// carries the full report for callers that want to await it.
    pub fn start_send(
        &self,
        job_id: &str,
        request: SendSnapshotRequest,
    ) -> Result<JoinHandle<PipelineReport>, RequestError> {
        request.validate()?;

        let transfer = commands::send_command(&self.config, &request);
        let buffer = commands::mbuffer_outbound_command(&self.config, &request);

        info!(
            "Sending snapshot {} to {}:{} (job {})",
            request.snapshot_name, request.host, request.port, job_id
        );

        Ok(self.spawn_pipeline(job_id, transfer, buffer, PrimaryRole::Producer))
    }

    /// Start a receive pipeline: an inbound mbuffer listener feeding
    /// `zfs receive`, whose own output stays on the agent console.
    pub fn start_receive(
        &self,
        job_id: &str,
        request: ReceiveSnapshotRequest,
    ) -> Result<JoinHandle<PipelineReport>, RequestError> {
        let transfer = commands::receive_command(&self.config, &request);
        let buffer = commands::mbuffer_inbound_command(&self.config, &request);

        info!(
            "Receiving snapshot into {} on port {} (job {})",
            request.target, request.port, job_id
        );

        Ok(self.spawn_pipeline(job_id, transfer, buffer, PrimaryRole::Consumer))
    }

    fn spawn_pipeline(
        &self,
        job_id: &str,
        transfer: ProcessCommand,
        buffer: ProcessCommand,
        role: PrimaryRole,
    ) -> JoinHandle<PipelineReport> {
        let job_id = job_id.to_string();
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let report = run_pair(transfer, buffer, role).await;

            // The notification carries the outcome, so it is attempted only
            // once the primary process has fully resolved.
            let code = match &report.outcome {
                Ok(code) => {
                    info!("Job {} finished with code {}", job_id, code);
                    *code
                }
                Err(e) => {
                    error!("Job {} failed: {}", job_id, e);
                    e.notification_code()
                }
            };

            if let Err(e) = notifier.notify(&job_id, code).await {
                warn!("Notification for job {} failed: {}", job_id, e);
            }

            report
        })
    }
}
