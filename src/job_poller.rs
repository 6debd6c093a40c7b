// job_poller.rs
use crate::errors::PipelineError;
use crate::image_diffusion::ImageJobClient;
use crate::models::{JobHandle, JobStatus};

use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Waits for `handle` to reach a terminal status and returns the image reference.
///
/// Every attempt sleeps the full interval before querying. A transient status
/// error (429, 5xx) uses up its attempt and polling goes on; any other error
/// ends the run as `StatusCheck`. Running out of attempts yields `Timeout`,
/// which says nothing about the remote job itself.
pub async fn poll_until_complete(
    client: &dyn ImageJobClient,
    handle: &JobHandle,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<String, PipelineError> {
    for attempt in 1..=policy.max_attempts {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Polling for job {} cancelled before attempt {}", handle.id, attempt);
                return Err(PipelineError::Cancelled);
            }
            _ = sleep(policy.interval) => {}
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Polling for job {} cancelled during attempt {}", handle.id, attempt);
                return Err(PipelineError::Cancelled);
            }
            status = client.query_status(handle) => status,
        };

        match status {
            Ok(JobStatus::Complete(url)) => {
                info!("Job {} complete after {} checks", handle.id, attempt);
                return Ok(url);
            }
            Ok(JobStatus::Failed(reason)) => {
                warn!("Job {} failed on check {}: {}", handle.id, attempt, reason);
                return Err(PipelineError::JobFailed(reason));
            }
            Ok(JobStatus::Pending) => {
                debug!("Job {} pending ({}/{})", handle.id, attempt, policy.max_attempts);
            }
            Err(e) if e.is_transient() => {
                warn!("Status check {}/{} for job {} failed: {}", attempt, policy.max_attempts, handle.id, e);
            }
            Err(e) => {
                error!("Status check for job {} failed, giving up: {}", handle.id, e);
                return Err(PipelineError::status_check(e));
            }
        }
    }

    warn!("Job {} not ready after {} checks", handle.id, policy.max_attempts);
    Err(PipelineError::Timeout {
        attempts: policy.max_attempts,
    })
}
