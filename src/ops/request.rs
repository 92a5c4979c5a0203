//! Operation request value objects. Full schema validation belongs to the
//! HTTP layer in front of the agent; the one invariant enforced here is the
//! incremental-send source requirement, checked before any command is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Incremental send requires a source snapshot name")]
    MissingSourceSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSnapshotRequest {
    pub snapshot_name: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroySnapshotRequest {
    pub snapshot_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendSnapshotRequest {
    pub snapshot_name: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub incremental: bool,
    #[serde(default)]
    pub source_snapshot_name: Option<String>,
    #[serde(default)]
    pub include_properties: bool,
    #[serde(default)]
    pub mbuffer_size: Option<String>,
    #[serde(default)]
    pub mbuffer_rate: Option<String>,
}

impl SendSnapshotRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.incremental
            && self
                .source_snapshot_name
                .as_deref()
                .is_none_or(str::is_empty)
        {
            return Err(RequestError::MissingSourceSnapshot);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveSnapshotRequest {
    pub target: String,
    pub port: u16,
    #[serde(default)]
    pub force_rollback: bool,
    #[serde(default)]
    pub mbuffer_size: Option<String>,
    #[serde(default)]
    pub mbuffer_rate: Option<String>,
}
