//! Fire-and-forget completion notifications to the remote controller.
//! Failures here are logged by the caller and never affect an operation's
//! own outcome.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Controller responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, job_id: &str, code: i32) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct NotifyPayload<'a> {
    job_id: &'a str,
    status_code: i32,
}

/// Posts completion reports to the controller API as JSON.
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, job_id: &str, code: i32) -> Result<(), NotifyError> {
        debug!(
            "Notifying controller at {}: job {} finished with code {}",
            self.url, job_id, code
        );

        let response = self
            .client
            .post(&self.url)
            .json(&NotifyPayload {
                job_id,
                status_code: code,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

/// Stands in when no controller endpoint is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, job_id: &str, code: i32) -> Result<(), NotifyError> {
        debug!(
            "No controller configured; job {} finished with code {}",
            job_id, code
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization() {
        let payload = NotifyPayload {
            job_id: "job-42",
            status_code: 1,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"job_id": "job-42", "status_code": 1})
        );
    }

    #[tokio::test]
    async fn test_noop_notifier_always_succeeds() {
        assert!(NoopNotifier.notify("job-1", 0).await.is_ok());
    }
}
